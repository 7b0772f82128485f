//! Preprocessing errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Splitter settings that cannot produce windows.
    #[error("Invalid preprocessor configuration: {0}")]
    InvalidConfig(String),

    /// Unknown split unit name.
    #[error("Unknown split unit '{0}': expected word, sentence or passage")]
    UnknownSplitUnit(String),
}

impl PreprocessError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type PreprocessResult<T> = Result<T, PreprocessError>;
