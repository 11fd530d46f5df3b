//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ConnectorConfig;
use crate::engine::{Message, SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::state::StateManager;
use crate::streams;
use crate::types::JsonValue;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check { config_json } => self.check(config_json.as_deref()).await,
            Commands::Discover => self.discover(),
            Commands::Read {
                streams,
                config_json,
                max_records,
                state_per_page,
                continue_on_error,
            } => {
                self.read(
                    streams.as_deref(),
                    config_json.as_deref(),
                    *max_records,
                    *state_per_page,
                    *continue_on_error,
                )
                .await
            }
            Commands::Spec => self.spec(),
        }
    }

    /// Load configuration
    fn load_config(&self, inline: Option<&str>) -> Result<ConnectorConfig> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return ConnectorConfig::from_json(json_str);
        }

        if let Some(path) = &self.cli.config {
            return ConnectorConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration provided (use -C <file> or --config-json)",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Check connection
    async fn check(&self, config_json: Option<&str>) -> Result<()> {
        let config = self.load_config(config_json)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Checking connection to {}", config.base_url())
            }
        }));

        let client = HttpClient::from_connector(&config)?;

        // One-record probe against the calls endpoint; any 2xx means the
        // credentials and base URL are usable.
        let mut query = vec![("limit".to_string(), "1".to_string())];
        query.extend(streams::calls_base_query(&config, None));
        let request = RequestConfig::new().query_pairs(query);

        match client
            .get_json_with_config::<JsonValue>(streams::calls().path, request)
            .await
        {
            Ok(_) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful"
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
            }
        }

        Ok(())
    }

    /// Discover streams
    ///
    /// The stream set and schemas are static, so discovery needs no
    /// configuration and no network access.
    fn discover(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": streams::catalog()
        }));

        Ok(())
    }

    /// Read data from streams
    async fn read(
        &self,
        stream_names: Option<&str>,
        config_json: Option<&str>,
        max_records: Option<usize>,
        state_per_page: bool,
        continue_on_error: bool,
    ) -> Result<()> {
        let config = self.load_config(config_json)?;
        let state = self.load_state()?;
        let client = HttpClient::from_connector(&config)?;

        // Build sync config
        let mut sync_config = SyncConfig::new();
        if let Some(names) = stream_names {
            let selected: Vec<String> = names
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            sync_config = sync_config.with_streams(selected);
        }
        if let Some(max) = max_records {
            sync_config = sync_config.with_max_records(max);
        }
        if state_per_page {
            sync_config = sync_config.with_state_per_page(true);
        }
        if continue_on_error {
            sync_config = sync_config.with_fail_fast(false);
        }

        let mut engine = SyncEngine::new(client, config, state).with_sync_config(sync_config);

        // Messages print as the engine produces them; a checkpoint only
        // persists after the records it covers have printed, so a failed run
        // can always be resumed from the emitted state.
        let sync_result = engine
            .sync_with(|msg| self.output_engine_message(&msg))
            .await;
        let status = match &sync_result {
            Ok(()) => "SUCCEEDED",
            Err(e) => {
                self.output_message(&json!({
                    "type": "LOG",
                    "log": {
                        "level": "ERROR",
                        "message": format!("Sync failed: {e}")
                    }
                }));
                "FAILED"
            }
        };

        // Persist final state when backed by a file, and always emit it to
        // stdout so the caller can capture it.
        let state_file_path: Option<String> = if engine.state().is_in_memory() {
            None
        } else {
            engine.state().save().await?;
            Some(engine.state().path().display().to_string())
        };

        let final_state = engine.state().to_json().await?;
        self.output_message(&json!({
            "type": "STATE",
            "state": serde_json::from_str::<Value>(&final_state).unwrap_or_default()
        }));

        // Emit sync summary for programmatic consumption
        let stats = engine.stats();
        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": status,
                "connector": crate::NAME,
                "total_records": stats.records_synced,
                "streams_synced": stats.streams_synced,
                "pages_fetched": stats.pages_fetched,
                "details_fetched": stats.details_fetched,
                "details_missing": stats.details_missing,
                "records_filtered": stats.records_filtered,
                "errors": stats.errors,
                "duration_ms": stats.duration_ms,
                "state_file": state_file_path
            }
        }));

        sync_result
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": {
                "documentationUrl": "https://github.com/solidafy/copilot-source",
                "connectionSpecification": ConnectorConfig::spec().to_json()
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }

    /// Output an engine message
    fn output_engine_message(&self, msg: &Message) {
        match msg {
            Message::Record {
                stream,
                record,
                emitted_at,
            } => {
                self.output_message(&json!({
                    "type": "RECORD",
                    "record": {
                        "stream": stream,
                        "data": record,
                        "emitted_at": emitted_at.timestamp_millis()
                    }
                }));
            }
            Message::State { stream, data } => {
                self.output_message(&json!({
                    "type": "STATE",
                    "state": {
                        "type": "STREAM",
                        "stream": {
                            "stream_descriptor": {
                                "name": stream
                            },
                            "stream_state": data
                        }
                    }
                }));
            }
            Message::Log { level, message } => {
                self.output_message(&json!({
                    "type": "LOG",
                    "log": {
                        "level": level,
                        "message": message
                    }
                }));
            }
        }
    }
}
