//! Tracing setup. Logs always go to stderr: in stdio mode stdout carries the MCP stream.

use crate::error::{Result, ServerError};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when it is set.
///
/// # Errors
///
/// Returns [`ServerError::Startup`] if the filter directive is invalid or a global subscriber
/// is already installed.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| ServerError::Startup(format!("invalid log level '{level}': {e}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| ServerError::Startup(format!("failed to initialize tracing: {e}")))
}
