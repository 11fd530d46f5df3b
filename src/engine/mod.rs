//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives call pagination, detail dispatch, and checkpoints
//! - `SyncConfig` - Per-run configuration (stream selection, record limit)
//! - Message types for output (Record, State, Log)

mod types;

pub use types::{Message, SyncConfig, SyncStats};

use crate::config::ConnectorConfig;
use crate::cursor::{self, ReplicationCursor};
use crate::error::{Error, Result};
use crate::filter::RecordFilter;
use crate::http::{HttpClient, RequestConfig};
use crate::normalize::{self, RecordNormalizer};
use crate::pagination::{NextPage, PaginationState, Paginator, SkipPaginator};
use crate::state::StateManager;
use crate::streams::{self, StreamDef};
use crate::types::{JsonObject, JsonValue, QueryPairs};
use serde_json::json;
use std::time::Instant;
use tracing::{error, warn};

/// Which streams a run emits
///
/// Detail records derive from parent pages, so parent pagination always runs
/// even when only `call_details` is selected; selection only controls what
/// gets emitted.
#[derive(Debug, Clone, Copy)]
struct StreamSelection {
    emit_calls: bool,
    emit_details: bool,
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Connector configuration
    config: ConnectorConfig,
    /// State manager
    state: StateManager,
    /// Per-run configuration
    sync_config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, config: ConnectorConfig, state: StateManager) -> Self {
        Self {
            client,
            config,
            state,
            sync_config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set per-run configuration
    #[must_use]
    pub fn with_sync_config(mut self, sync_config: SyncConfig) -> Self {
        self.sync_config = sync_config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = SyncStats::default();
    }

    /// Run a full sync pass over the selected streams, collecting every
    /// message in memory
    ///
    /// Checkpoints become durable while the collected messages are still
    /// buffered here. Callers that must deliver records before the covering
    /// checkpoint persists should use [`sync_with`](Self::sync_with).
    pub async fn sync(&mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        self.sync_with(|msg| messages.push(msg)).await?;
        Ok(messages)
    }

    /// Run a full sync pass, handing each message to `sink` as it is produced
    ///
    /// A page's records reach the sink before the checkpoint covering them is
    /// persisted, so an interrupted run never records a cursor past an
    /// undelivered record.
    pub async fn sync_with(&mut self, mut sink: impl FnMut(Message)) -> Result<()> {
        let selection = self.resolve_selection()?;
        self.sync_calls(selection, &mut sink).await
    }

    /// Resolve the stream selection against the known stream set
    fn resolve_selection(&self) -> Result<StreamSelection> {
        let Some(names) = &self.sync_config.streams else {
            return Ok(StreamSelection {
                emit_calls: true,
                emit_details: true,
            });
        };

        let mut selection = StreamSelection {
            emit_calls: false,
            emit_details: false,
        };
        for name in names {
            match name.as_str() {
                streams::CALLS => selection.emit_calls = true,
                streams::CALL_DETAILS => selection.emit_details = true,
                other => {
                    return Err(Error::StreamNotFound {
                        stream: other.to_string(),
                    });
                }
            }
        }
        Ok(selection)
    }

    /// Sync the calls stream, dispatching detail fetches per accepted record
    async fn sync_calls(
        &mut self,
        selection: StreamSelection,
        sink: &mut dyn FnMut(Message),
    ) -> Result<()> {
        let start = Instant::now();

        let calls_def = streams::calls();
        let details_def = streams::call_details();

        sink(Message::info(format!(
            "Starting sync for stream: {}",
            calls_def.name
        )));

        // Resolve the replication cursor: persisted state wins over the
        // configured start date.
        let persisted = self.state.get_cursor(streams::CALLS).await;
        let mut replication = ReplicationCursor::from_state(
            persisted.as_deref(),
            self.config.start_date,
            self.config.replication_bound,
        )?;

        let filter = RecordFilter::from_config(&self.config);
        let normalizer = RecordNormalizer::new();
        let paginator = SkipPaginator::calls(self.config.page_size);

        // The wire filter is fixed for the whole run; only persisted state
        // moves between runs.
        let wire_bound = replication.filter_param().map(|(_, value)| value);
        let base_params = streams::calls_base_query(&self.config, wire_bound.as_deref());

        let mut pagination_state = PaginationState::new();
        let mut page_params = paginator.initial_params(&pagination_state);
        let mut records_since_checkpoint: u64 = 0;
        let mut last_checkpoint: Option<String> = None;
        let mut hit_max = false;

        loop {
            let mut query: QueryPairs = page_params.clone();
            query.extend(base_params.iter().cloned());

            let request = RequestConfig::new().query_pairs(query);
            let body: JsonValue = self
                .client
                .get_json_with_config(calls_def.path, request)
                .await?;
            self.stats.add_page();

            let records = normalize::extract_records(&body, calls_def.records_path);
            let fetched = records.len();
            sink(Message::debug(format!(
                "Page {}: fetched {fetched} calls",
                pagination_state.page + 1
            )));

            for record in records {
                if self.reached_max() {
                    hit_max = true;
                    break;
                }

                if !filter.accept(&record) {
                    self.stats.add_filtered();
                    continue;
                }

                let ts = record
                    .get("last_modified_time")
                    .and_then(JsonValue::as_str)
                    .and_then(|raw| cursor::parse_timestamp(raw).ok());

                // The server filter is not trusted to honor the boundary
                // semantics; enforce the configured bound here.
                if let Some(ts) = ts {
                    if !replication.accepts(ts) {
                        self.stats.add_filtered();
                        continue;
                    }
                }

                let Some(JsonValue::Object(mut call)) = filter.project(record) else {
                    self.stats.add_filtered();
                    continue;
                };

                normalizer.normalize_call(&mut call);
                let call_id = call
                    .get("id")
                    .and_then(JsonValue::as_str)
                    .map(ToString::to_string);

                if selection.emit_calls {
                    sink(Message::record(calls_def.name, JsonValue::Object(call)));
                    self.stats.add_records(1);
                }

                if selection.emit_details && !self.reached_max() {
                    if let Some(call_id) = &call_id {
                        match self.fetch_call_detail(&details_def, call_id).await? {
                            Some(mut detail) => {
                                normalizer.normalize_call_detail(&mut detail);
                                sink(Message::record(
                                    details_def.name,
                                    JsonValue::Object(detail),
                                ));
                                self.stats.add_records(1);
                            }
                            None => {
                                sink(Message::debug(format!(
                                    "Call details not found for call {call_id}, skipping"
                                )));
                            }
                        }
                    } else {
                        sink(Message::warn(
                            "Call record has no id, skipping detail fetch",
                        ));
                    }
                }

                // The cursor only advances past records that were accepted
                // and emitted.
                if let Some(ts) = ts {
                    replication.advance(ts);
                }
                records_since_checkpoint += 1;
            }

            // Checkpoint at page boundaries once enough records accumulated.
            // The page's records have already gone through the sink at this
            // point, so the persisted cursor never gets ahead of delivery.
            let interval = self.config.checkpoint_interval;
            let interval_reached = interval > 0 && records_since_checkpoint >= interval;
            if interval_reached || (self.sync_config.state_per_page && records_since_checkpoint > 0)
            {
                self.checkpoint_cursor(&replication, &mut last_checkpoint, sink)
                    .await?;
                records_since_checkpoint = 0;
            }

            if hit_max {
                sink(Message::info(format!(
                    "Reached record limit of {}",
                    self.sync_config.max_records
                )));
                break;
            }

            match paginator.process_response(&body, fetched, &mut pagination_state) {
                NextPage::Continue { query_params } => page_params = query_params,
                NextPage::Done => break,
            }
        }

        // Always checkpoint at stream end
        self.checkpoint_cursor(&replication, &mut last_checkpoint, sink)
            .await?;

        if selection.emit_calls {
            self.stats.add_stream();
        }
        if selection.emit_details {
            self.stats.add_stream();
        }
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        sink(Message::info(format!(
            "Completed sync for {}: {} records in {} pages ({} details fetched, {} missing, {} filtered)",
            calls_def.name,
            self.stats.records_synced,
            self.stats.pages_fetched,
            self.stats.details_fetched,
            self.stats.details_missing,
            self.stats.records_filtered,
        )));

        Ok(())
    }

    /// Fetch the detail record for one call
    ///
    /// A 404 or an empty envelope is a missing detail, not an error. Other
    /// failures respect the fail-fast setting.
    async fn fetch_call_detail(
        &mut self,
        def: &StreamDef,
        call_id: &str,
    ) -> Result<Option<JsonObject>> {
        let request = RequestConfig::new().query_pairs(streams::call_details_query(call_id));

        let body: JsonValue = match self.client.get_json_with_config(def.path, request).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                self.stats.add_detail_missing();
                return Ok(None);
            }
            Err(e) if !self.sync_config.fail_fast => {
                self.stats.add_error();
                error!(call_id, error = %e, "Detail fetch failed, continuing");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match normalize::extract_records(&body, def.records_path)
            .into_iter()
            .next()
        {
            Some(JsonValue::Object(detail)) => {
                self.stats.add_detail();
                Ok(Some(detail))
            }
            Some(_) => {
                self.stats.add_detail_missing();
                warn!(call_id, "Detail record is not an object, skipping");
                Ok(None)
            }
            None => {
                self.stats.add_detail_missing();
                warn!(call_id, "No 'call' key found in response");
                Ok(None)
            }
        }
    }

    /// Persist the cursor and emit a state message when it moved
    async fn checkpoint_cursor(
        &mut self,
        replication: &ReplicationCursor,
        last_checkpoint: &mut Option<String>,
        sink: &mut dyn FnMut(Message),
    ) -> Result<()> {
        let Some(value) = replication.to_state() else {
            return Ok(());
        };
        if last_checkpoint.as_deref() == Some(value.as_str()) {
            return Ok(());
        }

        self.state.checkpoint(streams::CALLS, value.clone()).await?;
        sink(Message::state(
            streams::CALLS,
            json!({ "cursor": value.clone() }),
        ));
        *last_checkpoint = Some(value);
        Ok(())
    }

    /// Check whether the record limit has been reached
    fn reached_max(&self) -> bool {
        self.sync_config.max_records > 0
            && self.stats.records_synced >= self.sync_config.max_records
    }
}

#[cfg(test)]
mod tests;
