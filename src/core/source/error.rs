//! Error types for the source index module.

use thiserror::Error;

/// Errors raised while talking to a source search index.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Invalid connection settings (hosts/ports mismatch, unreadable CA bundle).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure: refused connection, DNS, TLS handshake, timeout.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials rejected by the cluster (401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The cluster answered with a non-success status.
    #[error("Request failed with status {status}: {reason}")]
    Request { status: u16, reason: String },

    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A filter mapping could not be parsed.
    #[error("Invalid filter: {0}")]
    Filter(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading certificates).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid response error with the given message.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a filter error with the given message.
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    /// Map an HTTP error status and body to the matching variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let reason = body.into();
        match status {
            401 | 403 => Self::Authentication(format!("status {}: {}", status, reason)),
            _ => Self::Request { status, reason },
        }
    }

    /// Whether the failure happened before the cluster answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Result type alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
