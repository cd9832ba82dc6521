//! Error types for the I14Y registry client.
//!
//! Every failure the client can produce is one [`I14yError`] variant. Registry
//! rejections keep the parsed problem document (`title` / `detail`) so that
//! callers can show a short summary while the full dump goes to the error log.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry operations
pub type I14yResult<T> = Result<T, I14yError>;

/// Errors raised while talking to the I14Y registry.
#[derive(Debug, Error)]
pub enum I14yError {
    /// Missing or inconsistent connection settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The token endpoint refused the client credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The registry answered with a non-success status.
    ///
    /// `hint` carries an operator-facing suggestion for well-known rejections
    /// such as posting a concept that already exists.
    #[error("Request failed with status {status}: {title}: {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
        hint: Option<String>,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A local input file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid argument supplied by the caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl I14yError {
    /// HTTP status of a registry rejection, if this error is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            I14yError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Operator hint attached to a registry rejection.
    pub fn hint(&self) -> Option<&str> {
        match self {
            I14yError::Api { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}
