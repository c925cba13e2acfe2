//! Error types for `catalog-jsonapi`.

use crate::redact::sanitize_reqwest_error;
use thiserror::Error;

/// Main error type for JSON:API access and flattening.
#[derive(Error, Debug)]
pub enum JsonApiError {
    /// Configuration errors (invalid base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream answered with a non-success status other than 404.
    #[error("Transport error: upstream returned HTTP {status} {reason}")]
    Transport { status: u16, reason: String },

    /// HTTP client errors (connect, DNS, body read). URLs are redacted.
    #[error("Request error: {0}")]
    Request(String),

    /// The upstream body is not a JSON:API document we can read.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The document is structurally invalid (missing primary id/type).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for JsonApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(sanitize_reqwest_error(&value))
    }
}

/// Result type alias for JSON:API operations.
pub type Result<T> = std::result::Result<T, JsonApiError>;
