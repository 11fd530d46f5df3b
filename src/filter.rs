//! Record filtering and projection
//!
//! Drops calls whose status falls outside the configured whitelist and
//! projects accepted records into the emitted shape. Rejection is a silent
//! drop: counted and logged at debug, never an error.

use crate::config::ConnectorConfig;
use crate::types::JsonValue;
use std::collections::HashSet;
use tracing::debug;

/// Status whitelist and projection for call records
#[derive(Debug, Clone)]
pub struct RecordFilter {
    allowed_statuses: HashSet<String>,
}

impl RecordFilter {
    /// Create a filter from an allowed-status list
    pub fn new(allowed_statuses: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed_statuses: allowed_statuses.into_iter().collect(),
        }
    }

    /// Create a filter from connector configuration
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(config.allowed_statuses.iter().cloned())
    }

    /// Check whether a record's status is in the whitelist.
    ///
    /// Records without a string `status` field are rejected.
    pub fn accept(&self, record: &JsonValue) -> bool {
        match record.get("status").and_then(JsonValue::as_str) {
            Some(status) => self.allowed_statuses.contains(status),
            None => {
                debug!("dropping record without a status field");
                false
            }
        }
    }

    /// Project an accepted record into the emitted shape.
    ///
    /// Upstream fields pass through unchanged, unknown fields included; only
    /// non-object payloads are rejected.
    pub fn project(&self, record: JsonValue) -> Option<JsonValue> {
        if record.is_object() {
            Some(record)
        } else {
            debug!("dropping non-object record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn default_filter() -> RecordFilter {
        RecordFilter::new(vec![
            "PROCESSED".to_string(),
            "POST_PROCESSING_DONE".to_string(),
        ])
    }

    #[test]
    fn test_accepts_whitelisted_statuses() {
        let filter = default_filter();
        assert!(filter.accept(&json!({"id": "c1", "status": "PROCESSED"})));
        assert!(filter.accept(&json!({"id": "c2", "status": "POST_PROCESSING_DONE"})));
    }

    #[test]
    fn test_rejects_other_statuses() {
        let filter = default_filter();
        assert!(!filter.accept(&json!({"id": "c3", "status": "IN_PROGRESS"})));
        assert!(!filter.accept(&json!({"id": "c4", "status": "FAILED"})));
        assert!(!filter.accept(&json!({"id": "c5", "status": "processed"})));
    }

    #[test]
    fn test_rejects_missing_or_malformed_status() {
        let filter = default_filter();
        assert!(!filter.accept(&json!({"id": "c6"})));
        assert!(!filter.accept(&json!({"id": "c7", "status": null})));
        assert!(!filter.accept(&json!({"id": "c8", "status": 3})));
    }

    #[test]
    fn test_custom_whitelist() {
        let filter = RecordFilter::new(vec!["IN_PROGRESS".to_string()]);
        assert!(filter.accept(&json!({"status": "IN_PROGRESS"})));
        assert!(!filter.accept(&json!({"status": "PROCESSED"})));
    }

    #[test]
    fn test_project_passes_unknown_fields() {
        let filter = default_filter();
        let record = json!({
            "id": "c1",
            "status": "PROCESSED",
            "brand_new_field": {"nested": true}
        });

        let projected = filter.project(record.clone()).unwrap();
        assert_eq!(projected, record);
    }

    #[test]
    fn test_project_rejects_non_objects() {
        let filter = default_filter();
        assert!(filter.project(json!(["not", "an", "object"])).is_none());
        assert!(filter.project(json!("just a string")).is_none());
        assert!(filter.project(json!(null)).is_none());
    }
}
