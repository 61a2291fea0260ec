//! Error types for logdesk-core

use thiserror::Error;

/// Main error type for the logdesk-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connection refused, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success response from the LogCollector API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request rejected before it was sent
    #[error("invalid request: {0}")]
    Validation(String),

    /// Async runtime could not be created
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Best-effort text to show an operator when an action fails.
    ///
    /// API errors surface the backend's own `message`; everything else falls
    /// back to the display form.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Http(msg) | Error::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the resource did not exist on the server.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for logdesk-core
pub type Result<T> = std::result::Result<T, Error>;
