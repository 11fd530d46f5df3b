//! Connector configuration
//!
//! Typed configuration for the Copilot source connector. Loaded from a JSON
//! file or inline JSON; credentials are required, everything else carries a
//! default matching the upstream API.

use crate::error::{Error, Result};
use crate::types::{BackoffType, CursorBound, OptionStringExt, PropertyType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Maximum page size the calls endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Connector Config
// ============================================================================

/// Complete connector configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// API key credential (sent as the X-Api-Key header)
    pub api_key: String,

    /// API password credential (sent as the X-Api-Password header)
    pub api_password: String,

    /// Base URL for the Copilot REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Earliest record timestamp to extract; unset means full history
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// User-Agent header override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Records requested per page (API maximum is 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Records between cursor checkpoints
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Call statuses accepted by the record filter
    #[serde(default = "default_allowed_statuses")]
    pub allowed_statuses: Vec<String>,

    /// Whether to ask the API for private calls
    #[serde(default)]
    pub include_private: bool,

    /// Boundary semantics for the incremental lower bound
    #[serde(default)]
    pub replication_bound: CursorBound,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_api_url() -> String {
    "https://rest-api.copilot.clari.com".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_checkpoint_interval() -> u64 {
    100
}

fn default_allowed_statuses() -> Vec<String> {
    vec![
        "PROCESSED".to_string(),
        "POST_PROCESSING_DONE".to_string(),
    ]
}

impl ConnectorConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        if self.api_password.is_empty() {
            return Err(Error::missing_field("api_password"));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_value(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if self.checkpoint_interval == 0 {
            return Err(Error::invalid_value(
                "checkpoint_interval",
                "must be at least 1",
            ));
        }
        if self.allowed_statuses.is_empty() {
            return Err(Error::invalid_value(
                "allowed_statuses",
                "at least one status is required",
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// User-Agent header value, falling back to the crate identity
    pub fn resolved_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| format!("{}/{}", crate::NAME, crate::VERSION))
    }

    /// Configuration property metadata for the SPEC command
    pub fn spec() -> SpecConfig {
        let mut properties = BTreeMap::new();
        properties.insert(
            "api_key".to_string(),
            PropertyConfig::secret_string("API Key", "Copilot API key"),
        );
        properties.insert(
            "api_password".to_string(),
            PropertyConfig::secret_string("API Password", "Copilot API password"),
        );
        properties.insert(
            "api_url".to_string(),
            PropertyConfig::string("API URL", "Base URL for the Copilot REST API")
                .with_default(serde_json::Value::String(default_api_url())),
        );
        properties.insert(
            "start_date".to_string(),
            PropertyConfig::string(
                "Start Date",
                "Earliest record timestamp to extract (RFC 3339); unset extracts full history",
            )
            .with_format("date-time"),
        );
        properties.insert(
            "user_agent".to_string(),
            PropertyConfig::string("User Agent", "User-Agent header override"),
        );
        properties.insert(
            "page_size".to_string(),
            PropertyConfig::integer("Page Size", "Records requested per page (maximum 100)")
                .with_default(serde_json::json!(default_page_size())),
        );
        properties.insert(
            "checkpoint_interval".to_string(),
            PropertyConfig::integer(
                "Checkpoint Interval",
                "Records between cursor checkpoints",
            )
            .with_default(serde_json::json!(default_checkpoint_interval())),
        );
        properties.insert(
            "allowed_statuses".to_string(),
            PropertyConfig::new(
                PropertyType::Array,
                "Allowed Statuses",
                "Call statuses accepted by the record filter",
            )
            .with_default(serde_json::json!(default_allowed_statuses())),
        );
        properties.insert(
            "include_private".to_string(),
            PropertyConfig::new(
                PropertyType::Boolean,
                "Include Private",
                "Whether to ask the API for private calls",
            )
            .with_default(serde_json::json!(false)),
        );
        properties.insert(
            "replication_bound".to_string(),
            PropertyConfig::string(
                "Replication Bound",
                "Lower-bound semantics: inclusive (at-least-once) or exclusive",
            )
            .with_default(serde_json::json!("inclusive")),
        );

        SpecConfig {
            properties,
            required: vec!["api_key".to_string(), "api_password".to_string()],
        }
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("api_key", &"***")
            .field("api_password", &"***")
            .field("api_url", &self.api_url)
            .field("start_date", &self.start_date)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .field("allowed_statuses", &self.allowed_statuses)
            .field("include_private", &self.include_private)
            .field("replication_bound", &self.replication_bound)
            .field("http", &self.http)
            .finish()
    }
}

// ============================================================================
// Spec Config
// ============================================================================

/// Configuration specification for connector setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Configuration properties
    pub properties: BTreeMap<String, PropertyConfig>,

    /// Required property names
    #[serde(default)]
    pub required: Vec<String>,
}

impl SpecConfig {
    /// Render as a draft-07 connection specification document
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "Copilot Source Spec",
            "type": "object",
            "required": self.required,
            "properties": self.properties,
        })
    }
}

/// Configuration property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    /// Property type
    #[serde(rename = "type", default)]
    pub property_type: PropertyType,

    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,

    /// Property description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether this is a secret (should be masked)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secret: bool,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Format hint (e.g., "date-time", "uri")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl PropertyConfig {
    /// Create a property definition
    pub fn new(
        property_type: PropertyType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            property_type,
            title: Some(title.into()),
            description: Some(description.into()),
            secret: false,
            default: None,
            format: None,
        }
    }

    /// Create a string property
    pub fn string(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(PropertyType::String, title, description)
    }

    /// Create a masked string property
    pub fn secret_string(title: impl Into<String>, description: impl Into<String>) -> Self {
        let mut property = Self::string(title, description);
        property.secret = true;
        property
    }

    /// Create an integer property
    pub fn integer(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(PropertyType::Integer, title, description)
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the format hint
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// HTTP status codes to retry on
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Requests per second budget; 0 disables client-side rate limiting
    #[serde(default = "default_rps")]
    pub rate_limit_rps: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_statuses: default_retry_statuses(),
            retry_backoff: BackoffConfig::default(),
            rate_limit_rps: default_rps(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_rps() -> u32 {
    10
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

fn default_multiplier() -> f64 {
    2.0
}
