//! Error types for the MCP server.

use catalog_jsonapi::JsonApiError;
use thiserror::Error;

/// Main error type for the server binary and its hosts.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration errors (missing base URL, unreadable config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup errors (logging, transport failed to start)
    #[error("Startup error: {0}")]
    Startup(String),

    /// Runtime errors (transport terminated abnormally)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// JSON:API client errors surfaced at startup
    #[error(transparent)]
    JsonApi(#[from] JsonApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
