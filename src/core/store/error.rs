//! Error types for the document store module.

use thiserror::Error;

/// Unified error type for document store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error (invalid index name, missing values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initialization failure (startup, connection).
    #[error("Initialization failed: {0}")]
    Init(String),

    /// Query execution error.
    #[error("Query error: {0}")]
    Query(String),
}

impl StorageError {
    /// Create a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an initialization error with the given message.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = StorageError::config("invalid index name 'a b'");
        assert_eq!(err.to_string(), "Configuration error: invalid index name 'a b'");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(StorageError::init("boom"), StorageError::Init(_)));
        assert!(matches!(StorageError::query("syntax"), StorageError::Query(_)));
    }
}
