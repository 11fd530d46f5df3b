//! Tests for engine module

use super::*;
use crate::config::ConnectorConfig;
use crate::http::HttpClientConfig;
use crate::types::LogLevel;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_record() {
    let msg = Message::record("calls", json!({"id": "c1"}));
    assert!(msg.is_record());
    assert!(!msg.is_state());
    assert!(!msg.is_log());
}

#[test]
fn test_message_state() {
    let msg = Message::state("calls", json!({"cursor": "2024-01-01T00:00:00+00:00"}));
    assert!(msg.is_state());
    assert!(!msg.is_record());
}

#[test]
fn test_message_log() {
    let msg = Message::info("test message");
    assert!(msg.is_log());
    assert!(!msg.is_record());

    let msg = Message::debug("debug");
    assert!(msg.is_log());

    let msg = Message::warn("warning");
    assert!(msg.is_log());

    let msg = Message::error("error");
    assert!(msg.is_log());

    if let Message::Log { level, .. } = Message::error("boom") {
        assert_eq!(level, LogLevel::Error);
    }
}

// ============================================================================
// SyncConfig Tests
// ============================================================================

#[test]
fn test_sync_config_default() {
    let config = SyncConfig::default();
    assert!(config.streams.is_none());
    assert_eq!(config.max_records, 0);
    assert!(!config.state_per_page);
    assert!(config.fail_fast);
}

#[test]
fn test_sync_config_builder() {
    let config = SyncConfig::new()
        .with_streams(vec!["calls".to_string()])
        .with_max_records(1000)
        .with_state_per_page(true)
        .with_fail_fast(false);

    assert_eq!(config.streams, Some(vec!["calls".to_string()]));
    assert_eq!(config.max_records, 1000);
    assert!(config.state_per_page);
    assert!(!config.fail_fast);
}

// ============================================================================
// SyncStats Tests
// ============================================================================

#[test]
fn test_sync_stats_default() {
    let stats = SyncStats::new();
    assert_eq!(stats.records_synced, 0);
    assert_eq!(stats.pages_fetched, 0);
    assert_eq!(stats.details_fetched, 0);
    assert_eq!(stats.details_missing, 0);
    assert_eq!(stats.records_filtered, 0);
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_sync_stats_mutations() {
    let mut stats = SyncStats::new();

    stats.add_records(100);
    assert_eq!(stats.records_synced, 100);

    stats.add_page();
    stats.add_page();
    assert_eq!(stats.pages_fetched, 2);

    stats.add_detail();
    assert_eq!(stats.details_fetched, 1);

    stats.add_detail_missing();
    assert_eq!(stats.details_missing, 1);

    stats.add_filtered();
    stats.add_filtered();
    assert_eq!(stats.records_filtered, 2);

    stats.add_stream();
    assert_eq!(stats.streams_synced, 1);

    stats.add_error();
    assert_eq!(stats.errors, 1);

    stats.set_duration(1500);
    assert_eq!(stats.duration_ms, 1500);
}

// ============================================================================
// SyncEngine Tests
// ============================================================================

fn test_config(page_size: u32) -> ConnectorConfig {
    let mut config =
        ConnectorConfig::from_json(r#"{"api_key": "key", "api_password": "password"}"#).unwrap();
    config.page_size = page_size;
    config
}

fn engine_for(server: &MockServer, config: ConnectorConfig) -> SyncEngine {
    let http = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(http);
    SyncEngine::new(client, config, StateManager::in_memory())
}

fn call(id: &str, ts: &str) -> JsonValue {
    json!({
        "id": id,
        "status": "PROCESSED",
        "last_modified_time": ts,
        "title": format!("Call {id}"),
    })
}

fn detail_for(id: &str) -> JsonValue {
    json!({
        "call": {
            "id": id,
            "status": "PROCESSED",
            "transcript": [{"text": "hello", "start": 0, "end": 2}],
            "summary": {"full_summary": "A call."},
        }
    })
}

async fn mount_calls_page(server: &MockServer, calls: JsonValue) {
    Mock::given(method("GET"))
        .and(path("/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "calls": calls })))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path("/call-details"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_for(id)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sync_emits_parents_and_details() {
    let server = MockServer::start().await;

    mount_calls_page(
        &server,
        json!([
            call("c1", "2024-06-01T10:00:00Z"),
            call("c2", "2024-06-02T11:30:00Z"),
        ]),
    )
    .await;
    mount_detail(&server, "c1").await;
    mount_detail(&server, "c2").await;

    let mut engine = engine_for(&server, test_config(100));
    let messages = engine.sync().await.unwrap();

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 4); // 2 parents + 2 details

    let stats = engine.stats();
    assert_eq!(stats.records_synced, 4);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.details_fetched, 2);
    assert_eq!(stats.details_missing, 0);
    assert_eq!(stats.streams_synced, 2);
}

#[tokio::test]
async fn test_sync_tolerates_missing_details() {
    let server = MockServer::start().await;

    mount_calls_page(
        &server,
        json!([
            call("c1", "2024-06-01T10:00:00Z"),
            call("c2", "2024-06-02T11:30:00Z"),
        ]),
    )
    .await;
    mount_detail(&server, "c1").await;
    Mock::given(method("GET"))
        .and(path("/call-details"))
        .and(query_param("id", "c2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(100));
    let messages = engine.sync().await.unwrap();

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 3); // 2 parents + 1 detail

    let stats = engine.stats();
    assert_eq!(stats.details_fetched, 1);
    assert_eq!(stats.details_missing, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_sync_filters_by_status() {
    let server = MockServer::start().await;

    mount_calls_page(
        &server,
        json!([
            call("c1", "2024-06-01T10:00:00Z"),
            {"id": "c2", "status": "IN_PROGRESS", "last_modified_time": "2024-06-09T09:00:00Z"},
        ]),
    )
    .await;
    mount_detail(&server, "c1").await;

    // The rejected call must not trigger a detail fetch
    Mock::given(method("GET"))
        .and(path("/call-details"))
        .and(query_param("id", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_for("c2")))
        .expect(0)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(100));
    let messages = engine.sync().await.unwrap();

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 2); // c1 parent + c1 detail

    let stats = engine.stats();
    assert_eq!(stats.records_filtered, 1);

    // The filtered record's newer timestamp must not advance the cursor
    assert_eq!(
        engine.state().get_cursor("calls").await,
        Some("2024-06-01T10:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_sync_paginates_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param("limit", "2"))
        .and(query_param_is_missing("skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [
                call("c1", "2024-06-01T10:00:00Z"),
                call("c2", "2024-06-02T10:00:00Z"),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param("limit", "2"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [call("c3", "2024-06-03T10:00:00Z")]
        })))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(2));
    engine = engine.with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let messages = engine.sync().await.unwrap();

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 3);

    let stats = engine.stats();
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.records_synced, 3);
}

#[tokio::test]
async fn test_failed_sync_delivers_records_before_checkpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param("limit", "2"))
        .and(query_param_is_missing("skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [
                call("c1", "2024-06-01T10:00:00Z"),
                call("c2", "2024-06-02T10:00:00Z"),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = test_config(2);
    config.checkpoint_interval = 2;

    let http = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(0)
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(http);
    let mut engine = SyncEngine::new(client, config, StateManager::in_memory())
        .with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let mut delivered = Vec::new();
    let err = engine
        .sync_with(|msg| delivered.push(msg))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"));

    // Both page-one records were handed over before the failure, and the
    // checkpoint covering them came after the records themselves.
    let ids: Vec<_> = delivered
        .iter()
        .filter_map(|m| match m {
            Message::Record { record, .. } => record["id"].as_str().map(String::from),
            _ => None,
        })
        .collect();
    assert_eq!(ids, ["c1", "c2"]);

    let last_record = delivered.iter().rposition(|m| m.is_record()).unwrap();
    let checkpoint = delivered.iter().position(|m| m.is_state()).unwrap();
    assert!(last_record < checkpoint);

    // The persisted cursor covers only delivered records.
    assert_eq!(
        engine.state().get_cursor("calls").await,
        Some("2024-06-02T10:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_sync_respects_max_records() {
    let server = MockServer::start().await;

    mount_calls_page(
        &server,
        json!([
            call("c1", "2024-06-01T10:00:00Z"),
            call("c2", "2024-06-02T10:00:00Z"),
            call("c3", "2024-06-03T10:00:00Z"),
            call("c4", "2024-06-04T10:00:00Z"),
            call("c5", "2024-06-05T10:00:00Z"),
        ]),
    )
    .await;

    let mut engine = engine_for(&server, test_config(100));
    engine = engine.with_sync_config(
        SyncConfig::new()
            .with_streams(vec!["calls".to_string()])
            .with_max_records(3),
    );

    engine.sync().await.unwrap();
    assert_eq!(engine.stats().records_synced, 3);
}

#[tokio::test]
async fn test_sync_calls_only_skips_detail_fetches() {
    let server = MockServer::start().await;

    mount_calls_page(&server, json!([call("c1", "2024-06-01T10:00:00Z")])).await;
    Mock::given(method("GET"))
        .and(path("/call-details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_for("c1")))
        .expect(0)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(100));
    engine = engine.with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let messages = engine.sync().await.unwrap();

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(engine.stats().streams_synced, 1);
}

#[tokio::test]
async fn test_sync_details_only_emits_no_parents() {
    let server = MockServer::start().await;

    mount_calls_page(&server, json!([call("c1", "2024-06-01T10:00:00Z")])).await;
    mount_detail(&server, "c1").await;

    let mut engine = engine_for(&server, test_config(100));
    engine = engine
        .with_sync_config(SyncConfig::new().with_streams(vec!["call_details".to_string()]));

    let messages = engine.sync().await.unwrap();

    let streams: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, .. } => Some(stream.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(streams, vec!["call_details"]);
}

#[tokio::test]
async fn test_sync_unknown_stream_fails() {
    let server = MockServer::start().await;

    let mut engine = engine_for(&server, test_config(100));
    engine =
        engine.with_sync_config(SyncConfig::new().with_streams(vec!["meetings".to_string()]));

    let err = engine.sync().await.unwrap_err();
    assert!(err.to_string().contains("meetings"));
}

#[tokio::test]
async fn test_sync_persists_cursor_and_emits_state() {
    let server = MockServer::start().await;

    mount_calls_page(
        &server,
        json!([
            call("c1", "2024-06-01T10:00:00Z"),
            call("c2", "2024-06-15T10:30:00Z"),
            call("c3", "2024-06-10T08:00:00Z"),
        ]),
    )
    .await;

    let mut engine = engine_for(&server, test_config(100));
    engine = engine.with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let messages = engine.sync().await.unwrap();

    // Cursor lands on the maximum observed timestamp, not the last one
    assert_eq!(
        engine.state().get_cursor("calls").await,
        Some("2024-06-15T10:30:00+00:00".to_string())
    );

    let state_msgs: Vec<_> = messages.iter().filter(|m| m.is_state()).collect();
    assert_eq!(state_msgs.len(), 1);
    if let Message::State { stream, data } = state_msgs[0] {
        assert_eq!(stream, "calls");
        assert_eq!(data["cursor"], "2024-06-15T10:30:00+00:00");
    }
}

#[tokio::test]
async fn test_sync_sends_modified_filter_from_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param("filterModifiedGt", "2024-05-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "calls": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let state = StateManager::in_memory();
    state
        .set_cursor("calls", "2024-05-01T00:00:00+00:00".to_string())
        .await
        .unwrap();

    let http = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(http);
    let mut engine = SyncEngine::new(client, test_config(100), state)
        .with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let messages = engine.sync().await.unwrap();
    assert_eq!(engine.stats().records_synced, 0);

    // The prior cursor survives an empty run
    let state_msgs: Vec<_> = messages.iter().filter(|m| m.is_state()).collect();
    assert_eq!(state_msgs.len(), 1);
    assert_eq!(
        engine.state().get_cursor("calls").await,
        Some("2024-05-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_sync_omits_modified_filter_without_bound() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calls"))
        .and(query_param_is_missing("filterModifiedGt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "calls": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(100));
    engine = engine.with_sync_config(SyncConfig::new().with_streams(vec!["calls".to_string()]));

    let messages = engine.sync().await.unwrap();

    // Nothing observed and no bound: no state to checkpoint
    assert!(messages.iter().all(|m| !m.is_state()));
    assert_eq!(engine.state().get_cursor("calls").await, None);
}

#[tokio::test]
async fn test_sync_missing_calls_key_is_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pagination": {}})))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, test_config(100));
    let messages = engine.sync().await.unwrap();

    assert!(messages.iter().all(|m| !m.is_record()));
    assert_eq!(engine.stats().pages_fetched, 1);
}
