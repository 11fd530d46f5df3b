//! CLI module
//!
//! Command-line interface for running the connector.
//!
//! # Commands
//!
//! - `check` - Test connection to the API
//! - `discover` - List available streams with their schemas
//! - `read` - Extract data from streams
//! - `spec` - Show the configuration specification

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
