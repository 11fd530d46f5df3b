//! Record normalization
//!
//! Shapes raw API records into their emitted form: envelope extraction,
//! metrics stringification, and data-shape checks.

use crate::cursor;
use crate::types::{JsonObject, JsonValue};
use tracing::{debug, warn};

// ============================================================================
// Record Extraction
// ============================================================================

/// Extract records from a response body using a top-level key
///
/// The calls endpoint nests each page under `"calls"` (an array); the detail
/// endpoint nests a single record under `"call"` (an object). A missing or
/// null key yields no records.
pub fn extract_records(body: &JsonValue, records_path: &str) -> Vec<JsonValue> {
    match body.get(records_path) {
        Some(JsonValue::Array(records)) => records.clone(),
        Some(JsonValue::Null) | None => {
            debug!(records_path, "No records found under response key");
            Vec::new()
        }
        Some(record) => vec![record.clone()],
    }
}

// ============================================================================
// Record Normalizer
// ============================================================================

/// Normalizes call and call-detail records before emission
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Create a new normalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize a call record in place
    ///
    /// Stringifies `metrics` and checks that `last_modified_time` parses as a
    /// timestamp. An unparseable timestamp is logged and the record is still
    /// emitted; the cursor simply does not advance past it.
    pub fn normalize_call(&self, record: &mut JsonObject) {
        stringify_metrics(record);

        if let Some(raw) = record.get("last_modified_time").and_then(JsonValue::as_str) {
            if cursor::parse_timestamp(raw).is_err() {
                warn!(
                    last_modified_time = raw,
                    "Could not parse last_modified_time timestamp"
                );
            }
        }
    }

    /// Normalize a call-detail record in place
    ///
    /// Stringifies `metrics` and checks the detail substructures: `transcript`
    /// should be an array and `summary` an object. A shape mismatch is logged
    /// and the record is emitted as-is.
    pub fn normalize_call_detail(&self, record: &mut JsonObject) {
        stringify_metrics(record);

        if let Some(transcript) = record.get("transcript") {
            if !transcript.is_array() && !transcript.is_null() {
                warn!("Call detail transcript is not an array");
            }
        }
        if let Some(summary) = record.get("summary") {
            if !summary.is_object() && !summary.is_null() {
                warn!("Call detail summary is not an object");
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Replace a `metrics` object with its exact JSON text
///
/// Metric values include high-precision decimals; the serialized string must
/// reproduce every digit of the source document. Null passes through
/// unchanged; any other shape is dropped with a warning.
fn stringify_metrics(record: &mut JsonObject) {
    let Some(metrics) = record.get("metrics") else {
        return;
    };

    match metrics {
        JsonValue::Null => {}
        JsonValue::Object(_) => match serde_json::to_string(metrics) {
            Ok(text) => {
                record.insert("metrics".to_string(), JsonValue::String(text));
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize metrics to JSON - removing field");
                record.remove("metrics");
            }
        },
        _ => {
            warn!("Metrics field is not an object - removing field");
            record.remove("metrics");
        }
    }
}
