//! Replication cursor
//!
//! Tracks the maximum observed replication key across accepted records. The
//! cursor never regresses, carries the configured lower-bound semantics, and
//! renders the wire filter in the second-precision UTC form the API expects.

use crate::error::{Error, Result};
use crate::types::CursorBound;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Query parameter carrying the incremental lower bound
pub const FILTER_PARAM: &str = "filterModifiedGt";

/// Wire format for the incremental filter value
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Monotone replication cursor over record timestamps
#[derive(Debug, Clone)]
pub struct ReplicationCursor {
    /// Lower bound the run started from
    lower_bound: Option<DateTime<Utc>>,
    /// Boundary semantics for the lower bound
    bound: CursorBound,
    /// Maximum replication key observed so far
    current: Option<DateTime<Utc>>,
}

impl ReplicationCursor {
    /// Create a cursor from a starting bound
    pub fn new(lower_bound: Option<DateTime<Utc>>, bound: CursorBound) -> Self {
        Self {
            lower_bound,
            bound,
            current: lower_bound,
        }
    }

    /// Create a cursor from persisted state, falling back to the configured
    /// start date. Persisted state wins: a run never restarts behind where a
    /// previous run checkpointed.
    pub fn from_state(
        persisted: Option<&str>,
        start_date: Option<DateTime<Utc>>,
        bound: CursorBound,
    ) -> Result<Self> {
        let lower_bound = match persisted {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => start_date,
        };
        Ok(Self::new(lower_bound, bound))
    }

    /// Check whether a record timestamp satisfies the configured bound.
    ///
    /// Without a lower bound everything passes. Inclusive mode accepts the
    /// boundary timestamp itself (re-delivery allowed); exclusive mode
    /// requires strictly newer records.
    pub fn accepts(&self, ts: DateTime<Utc>) -> bool {
        match self.lower_bound {
            None => true,
            Some(bound) => match self.bound {
                CursorBound::Inclusive => ts >= bound,
                CursorBound::Exclusive => ts > bound,
            },
        }
    }

    /// Advance the cursor to max(current, ts). Never regresses.
    pub fn advance(&mut self, ts: DateTime<Utc>) {
        match self.current {
            Some(current) if current >= ts => {}
            _ => self.current = Some(ts),
        }
    }

    /// Current cursor value
    pub fn value(&self) -> Option<DateTime<Utc>> {
        self.current
    }

    /// Lower bound this run started from
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.lower_bound
    }

    /// Wire filter pair for page requests, absent when no bound exists.
    ///
    /// The filter is fixed for the whole run; only persisted state moves
    /// between runs.
    pub fn filter_param(&self) -> Option<(String, String)> {
        self.lower_bound
            .map(|bound| (FILTER_PARAM.to_string(), format_wire(bound)))
    }

    /// Serialized cursor for state persistence
    pub fn to_state(&self) -> Option<String> {
        self.current.map(|current| current.to_rfc3339())
    }
}

/// Format a timestamp in the API's filter dialect (seconds precision, Z)
pub fn format_wire(ts: DateTime<Utc>) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Parse a record or state timestamp
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC 3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try common formats
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
    ];

    for fmt in formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            let ndt = nd.and_hms_opt(0, 0, 0).unwrap();
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    Err(Error::decode(format!("Invalid timestamp format: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test_case("2024-01-15T10:30:00Z"; "zulu")]
    #[test_case("2024-01-15T10:30:00+00:00"; "offset")]
    #[test_case("2024-01-15T10:30:00.123Z"; "fractional zulu")]
    #[test_case("2024-01-15T10:30:00.123"; "naive fractional")]
    #[test_case("2024-01-15T10:30:00"; "naive")]
    #[test_case("2024-01-15 10:30:00"; "space separated")]
    fn test_parse_timestamp_formats(input: &str) {
        let parsed = parse_timestamp(input).unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let parsed = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(parsed, ts("2024-01-15T00:00:00Z"));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not-a-date").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_advance_is_monotone() {
        let mut cursor = ReplicationCursor::new(None, CursorBound::Inclusive);

        cursor.advance(ts("2024-01-02T00:00:00Z"));
        cursor.advance(ts("2024-01-05T00:00:00Z"));
        // An older timestamp must not move the cursor back.
        cursor.advance(ts("2024-01-03T00:00:00Z"));

        assert_eq!(cursor.value(), Some(ts("2024-01-05T00:00:00Z")));
    }

    #[test]
    fn test_advance_from_bound() {
        let bound = ts("2024-01-01T00:00:00Z");
        let mut cursor = ReplicationCursor::new(Some(bound), CursorBound::Inclusive);
        assert_eq!(cursor.value(), Some(bound));

        cursor.advance(ts("2023-12-01T00:00:00Z"));
        assert_eq!(cursor.value(), Some(bound));

        cursor.advance(ts("2024-02-01T00:00:00Z"));
        assert_eq!(cursor.value(), Some(ts("2024-02-01T00:00:00Z")));
    }

    #[test]
    fn test_accepts_without_bound() {
        let cursor = ReplicationCursor::new(None, CursorBound::Inclusive);
        assert!(cursor.accepts(ts("1999-01-01T00:00:00Z")));
    }

    #[test]
    fn test_accepts_boundary_inclusive() {
        let bound = ts("2024-01-01T00:00:00Z");
        let cursor = ReplicationCursor::new(Some(bound), CursorBound::Inclusive);

        assert!(cursor.accepts(bound));
        assert!(cursor.accepts(ts("2024-01-01T00:00:01Z")));
        assert!(!cursor.accepts(ts("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn test_accepts_boundary_exclusive() {
        let bound = ts("2024-01-01T00:00:00Z");
        let cursor = ReplicationCursor::new(Some(bound), CursorBound::Exclusive);

        assert!(!cursor.accepts(bound));
        assert!(cursor.accepts(ts("2024-01-01T00:00:01Z")));
        assert!(!cursor.accepts(ts("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn test_filter_param_wire_format() {
        let cursor = ReplicationCursor::new(
            Some(ts("2024-01-15T10:30:00.987Z")),
            CursorBound::Inclusive,
        );

        let (name, value) = cursor.filter_param().unwrap();
        assert_eq!(name, "filterModifiedGt");
        // Sub-second precision is truncated on the wire.
        assert_eq!(value, "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_filter_param_absent_without_bound() {
        let cursor = ReplicationCursor::new(None, CursorBound::Inclusive);
        assert!(cursor.filter_param().is_none());
    }

    #[test]
    fn test_filter_param_fixed_for_run() {
        let bound = ts("2024-01-01T00:00:00Z");
        let mut cursor = ReplicationCursor::new(Some(bound), CursorBound::Inclusive);

        cursor.advance(ts("2024-06-01T00:00:00Z"));
        // Advancing within the run does not move the wire filter.
        let (_, value) = cursor.filter_param().unwrap();
        assert_eq!(value, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_from_state_prefers_persisted() {
        let cursor = ReplicationCursor::from_state(
            Some("2024-03-01T00:00:00+00:00"),
            Some(ts("2024-01-01T00:00:00Z")),
            CursorBound::Inclusive,
        )
        .unwrap();
        assert_eq!(cursor.lower_bound(), Some(ts("2024-03-01T00:00:00Z")));

        let cursor = ReplicationCursor::from_state(
            None,
            Some(ts("2024-01-01T00:00:00Z")),
            CursorBound::Inclusive,
        )
        .unwrap();
        assert_eq!(cursor.lower_bound(), Some(ts("2024-01-01T00:00:00Z")));

        let cursor =
            ReplicationCursor::from_state(None, None, CursorBound::Inclusive).unwrap();
        assert!(cursor.lower_bound().is_none());
        assert!(cursor.filter_param().is_none());
    }

    #[test]
    fn test_state_round_trip() {
        let mut cursor = ReplicationCursor::new(None, CursorBound::Inclusive);
        cursor.advance(ts("2024-05-10T08:00:00Z"));

        let persisted = cursor.to_state().unwrap();
        let restored =
            ReplicationCursor::from_state(Some(&persisted), None, CursorBound::Inclusive)
                .unwrap();
        assert_eq!(restored.lower_bound(), Some(ts("2024-05-10T08:00:00Z")));
    }
}
