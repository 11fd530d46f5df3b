//! Engine types
//!
//! Message types and configuration for the sync engine.

use crate::types::{JsonValue, LogLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A message emitted during sync
#[derive(Debug, Clone)]
pub enum Message {
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// The record payload
        record: JsonValue,
        /// When the record was emitted
        emitted_at: DateTime<Utc>,
    },
    /// State update
    State {
        /// Stream name
        stream: String,
        /// State data (cursor)
        data: JsonValue,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            emitted_at: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(stream: impl Into<String>, data: JsonValue) -> Self {
        Self::State {
            stream: stream.into(),
            data,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a debug log
    pub fn debug(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Debug, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

/// Configuration for a sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Streams to emit; `None` selects all streams
    pub streams: Option<Vec<String>>,
    /// Maximum records to emit (0 = unlimited)
    pub max_records: usize,
    /// Emit a state checkpoint after every page, regardless of the
    /// configured checkpoint interval
    pub state_per_page: bool,
    /// Abort the run on a detail-fetch error instead of logging and
    /// continuing
    pub fail_fast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            streams: None,
            max_records: 0,
            state_per_page: false,
            fail_fast: true,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the streams to emit
    #[must_use]
    pub fn with_streams(mut self, streams: Vec<String>) -> Self {
        self.streams = Some(streams);
        self
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Emit state after each page
    #[must_use]
    pub fn with_state_per_page(mut self, emit: bool) -> Self {
        self.state_per_page = emit;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Total records emitted (parents and details)
    pub records_synced: usize,
    /// Total call pages fetched
    pub pages_fetched: usize,
    /// Detail records fetched
    pub details_fetched: usize,
    /// Detail fetches that returned no record (404 or empty envelope)
    pub details_missing: usize,
    /// Records dropped by the status filter or replication bound
    pub records_filtered: usize,
    /// Streams synced
    pub streams_synced: usize,
    /// Non-fatal errors encountered
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a fetched detail record
    pub fn add_detail(&mut self) {
        self.details_fetched += 1;
    }

    /// Add a missing detail
    pub fn add_detail_missing(&mut self) {
        self.details_missing += 1;
    }

    /// Add a filtered record
    pub fn add_filtered(&mut self) {
        self.records_filtered += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
