//! Stream definitions and catalog
//!
//! Declares the two Copilot streams (`calls` and its per-call `call_details`
//! child), their static JSON schemas, and the query parameters each endpoint
//! takes. Discovery publishes these definitions as a catalog.

use crate::config::ConnectorConfig;
use crate::cursor;
use crate::schema::{JsonSchema, JsonType, SchemaProperty};
use crate::types::{JsonValue, QueryPairs, SyncMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the parent calls stream
pub const CALLS: &str = "calls";

/// Name of the per-call detail stream
pub const CALL_DETAILS: &str = "call_details";

// ============================================================================
// Stream Definitions
// ============================================================================

/// Static definition of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDef {
    /// Stream name
    pub name: &'static str,
    /// Endpoint path relative to the API base URL
    pub path: &'static str,
    /// Top-level response key holding the records
    pub records_path: &'static str,
    /// Primary key fields
    pub primary_key: &'static [&'static str],
    /// Replication key field, when the stream supports incremental sync
    pub replication_key: Option<&'static str>,
}

impl StreamDef {
    /// Sync modes this stream supports
    pub fn supported_sync_modes(&self) -> Vec<SyncMode> {
        if self.replication_key.is_some() {
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        } else {
            vec![SyncMode::FullRefresh]
        }
    }
}

/// The calls stream definition
pub fn calls() -> StreamDef {
    StreamDef {
        name: CALLS,
        path: "/calls",
        records_path: "calls",
        primary_key: &["id"],
        replication_key: Some("last_modified_time"),
    }
}

/// The call-details stream definition
///
/// A child of `calls`: each parent record's id drives one detail fetch, so
/// the stream carries no replication key of its own.
pub fn call_details() -> StreamDef {
    StreamDef {
        name: CALL_DETAILS,
        path: "/call-details",
        records_path: "call",
        primary_key: &["id"],
        replication_key: None,
    }
}

/// All stream definitions in sync order
pub fn all() -> Vec<StreamDef> {
    vec![calls(), call_details()]
}

/// Look up a stream definition by name
pub fn by_name(name: &str) -> Option<StreamDef> {
    all().into_iter().find(|s| s.name == name)
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Base query parameters for the calls endpoint
///
/// `filterStatus` repeats once per allowed status. `filterModifiedGt` is only
/// sent when an incremental lower bound exists; pagination parameters are
/// appended separately.
pub fn calls_base_query(config: &ConnectorConfig, modified_after: Option<&str>) -> QueryPairs {
    let mut params: QueryPairs = vec![
        ("includePagination".to_string(), "false".to_string()),
        (
            "includePrivate".to_string(),
            config.include_private.to_string(),
        ),
    ];

    for status in &config.allowed_statuses {
        params.push(("filterStatus".to_string(), status.clone()));
    }

    if let Some(bound) = modified_after {
        params.push((cursor::FILTER_PARAM.to_string(), bound.to_string()));
    }

    params
}

/// Query parameters for a single call-details fetch
pub fn call_details_query(call_id: &str) -> QueryPairs {
    vec![
        ("includeTranscript".to_string(), "true".to_string()),
        ("includeSummary".to_string(), "true".to_string()),
        ("id".to_string(), call_id.to_string()),
    ]
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog of available streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

/// A single stream entry in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,

    /// JSON Schema for records of this stream
    pub json_schema: JsonValue,

    /// Sync modes this stream supports
    pub supported_sync_modes: Vec<SyncMode>,

    /// Default cursor field for incremental sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,

    /// Source-defined primary key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

/// Build the full catalog
pub fn catalog() -> Catalog {
    Catalog {
        streams: vec![
            catalog_stream(&calls(), &calls_schema()),
            catalog_stream(&call_details(), &call_details_schema()),
        ],
    }
}

fn catalog_stream(def: &StreamDef, schema: &JsonSchema) -> CatalogStream {
    CatalogStream {
        name: def.name.to_string(),
        json_schema: schema.to_json(),
        supported_sync_modes: def.supported_sync_modes(),
        default_cursor_field: def.replication_key.map(|k| vec![k.to_string()]),
        source_defined_primary_key: Some(
            def.primary_key.iter().map(|k| vec![(*k).to_string()]).collect(),
        ),
    }
}

// ============================================================================
// Schemas
// ============================================================================

/// JSON Schema for the calls stream
pub fn calls_schema() -> JsonSchema {
    let mut schema = JsonSchema::new().with_title(CALLS);
    add_call_properties(&mut schema);
    schema
}

/// JSON Schema for the call-details stream
///
/// Details carry every call field plus the transcript, summary, and
/// competitor-sentiment substructures.
pub fn call_details_schema() -> JsonSchema {
    let mut schema = JsonSchema::new().with_title(CALL_DETAILS);
    add_call_properties(&mut schema);

    schema.add_property(
        "deal_stage_live",
        SchemaProperty::nullable(JsonType::String).with_description("Deal stage during the call"),
    );
    schema.add_property(
        "transcript",
        SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
            (
                "text".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "start".to_string(),
                SchemaProperty::nullable(JsonType::Number),
            ),
            ("end".to_string(), SchemaProperty::nullable(JsonType::Number)),
            (
                "personId".to_string(),
                SchemaProperty::nullable(JsonType::Number),
            ),
            (
                "annotations".to_string(),
                SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
                    (
                        "tracker".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "phrase".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "category".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                ]))),
            ),
        ])))
        .with_description("Call transcript segments"),
    );
    schema.add_property(
        "summary",
        SchemaProperty::object(BTreeMap::from([
            (
                "full_summary".to_string(),
                SchemaProperty::nullable(JsonType::String)
                    .with_description("Complete call summary"),
            ),
            (
                "topics_discussed".to_string(),
                SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
                    (
                        "name".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "start_timestamp".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "end_timestamp".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "summary".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                ])))
                .with_description("Topics discussed during the call"),
            ),
            (
                "key_action_items".to_string(),
                SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
                    (
                        "action_item".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "speaker_name".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "start_timestamp".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                    (
                        "end_timestamp".to_string(),
                        SchemaProperty::nullable(JsonType::String),
                    ),
                ])))
                .with_description("Action items identified in the call"),
            ),
        ]))
        .with_description("Call summary information"),
    );
    schema.add_property(
        "competitor_sentiments",
        SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
            (
                "competitor_name".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "sentiment".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "reasoning".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "personId".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "turn_start_time".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
        ])))
        .with_description("Competitor mentions and sentiment analysis"),
    );

    schema
}

/// Properties shared by both streams
fn add_call_properties(schema: &mut JsonSchema) {
    schema.add_property(
        "id",
        SchemaProperty::nullable(JsonType::String).with_description("Unique call identifier"),
    );
    schema.add_property(
        "source_id",
        SchemaProperty::nullable(JsonType::String)
            .with_description("Source identifier from the calling platform"),
    );
    schema.add_property(
        "title",
        SchemaProperty::nullable(JsonType::String).with_description("Call title/topic"),
    );
    schema.add_property(
        "users",
        SchemaProperty::array(SchemaProperty::object(BTreeMap::from([
            (
                "userId".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "userEmail".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "isOrganizer".to_string(),
                SchemaProperty::nullable(JsonType::Boolean),
            ),
            (
                "personId".to_string(),
                SchemaProperty::nullable(JsonType::Integer),
            ),
        ])))
        .with_description("Internal users in the call"),
    );
    schema.add_property(
        "externalParticipants",
        SchemaProperty::array(SchemaProperty::object(participant_properties()))
            .with_description("External participants invited to the call"),
    );
    schema.add_property(
        "joinedParticipants",
        SchemaProperty::array(SchemaProperty::object(participant_properties()))
            .with_description("Participants who joined the call"),
    );
    schema.add_property(
        "status",
        SchemaProperty::nullable(JsonType::String).with_description("Call status"),
    );
    schema.add_property(
        "bot_not_join_reason",
        SchemaProperty::array(SchemaProperty::nullable(JsonType::String))
            .with_description("Reasons the bot didn't join"),
    );
    schema.add_property(
        "type",
        SchemaProperty::nullable(JsonType::String)
            .with_description("Call type (e.g., ZOOM, MS_TEAMS)"),
    );
    schema.add_property(
        "time",
        SchemaProperty::nullable(JsonType::String)
            .with_format("date-time")
            .with_description("Call start/scheduled time"),
    );
    schema.add_property(
        "icaluid",
        SchemaProperty::nullable(JsonType::String).with_description("iCal UID for the event"),
    );
    schema.add_property(
        "calendar_id",
        SchemaProperty::nullable(JsonType::String).with_description("Calendar ID"),
    );
    schema.add_property(
        "recurring_event_id",
        SchemaProperty::nullable(JsonType::String).with_description("ID for recurring events"),
    );
    schema.add_property(
        "original_start_time",
        SchemaProperty::nullable(JsonType::String)
            .with_format("date-time")
            .with_description("Original start time for rescheduled calls"),
    );
    schema.add_property(
        "last_modified_time",
        SchemaProperty::nullable(JsonType::String)
            .with_format("date-time")
            .with_description("When the call was last modified"),
    );
    schema.add_property(
        "audio_url",
        SchemaProperty::nullable(JsonType::String)
            .with_description("URL to call audio recording"),
    );
    schema.add_property(
        "video_url",
        SchemaProperty::nullable(JsonType::String)
            .with_description("URL to call video recording"),
    );
    schema.add_property(
        "disposition",
        SchemaProperty::nullable(JsonType::String).with_description("Call disposition"),
    );
    schema.add_property(
        "deal_name",
        SchemaProperty::nullable(JsonType::String).with_description("Associated deal name"),
    );
    schema.add_property(
        "deal_value",
        SchemaProperty::nullable(JsonType::String).with_description("Associated deal value"),
    );
    schema.add_property(
        "deal_close_date",
        SchemaProperty::nullable(JsonType::String)
            .with_format("date-time")
            .with_description("Associated deal close date"),
    );
    schema.add_property(
        "deal_stage_before_call",
        SchemaProperty::nullable(JsonType::String)
            .with_description("Deal stage before the call"),
    );
    schema.add_property(
        "account_name",
        SchemaProperty::nullable(JsonType::String).with_description("Associated account name"),
    );
    schema.add_property(
        "contact_names",
        SchemaProperty::array(SchemaProperty::nullable(JsonType::String))
            .with_description("Associated contact names"),
    );
    schema.add_property(
        "crm_info",
        SchemaProperty::object(BTreeMap::from([
            (
                "source_crm".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "deal_id".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "account_id".to_string(),
                SchemaProperty::nullable(JsonType::String),
            ),
            (
                "contact_ids".to_string(),
                SchemaProperty::array(SchemaProperty::nullable(JsonType::String)),
            ),
        ]))
        .with_description("CRM information associated with the call"),
    );
    schema.add_property(
        "bookmark_timestamps",
        SchemaProperty::array(
            SchemaProperty::nullable(JsonType::String).with_format("date-time"),
        )
        .with_description("Bookmark timestamps"),
    );
    schema.add_property(
        "metrics",
        SchemaProperty::nullable(JsonType::String)
            .with_description("Call metrics and analytics as a JSON string"),
    );
    schema.add_property(
        "call_review_page_url",
        SchemaProperty::nullable(JsonType::String).with_description("URL to review the call"),
    );
}

fn participant_properties() -> BTreeMap<String, SchemaProperty> {
    BTreeMap::from([
        (
            "name".to_string(),
            SchemaProperty::nullable(JsonType::String),
        ),
        (
            "email".to_string(),
            SchemaProperty::nullable(JsonType::String),
        ),
        (
            "phone".to_string(),
            SchemaProperty::nullable(JsonType::String),
        ),
        (
            "personId".to_string(),
            SchemaProperty::nullable(JsonType::Integer),
        ),
    ])
}
