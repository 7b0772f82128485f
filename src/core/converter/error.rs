//! Conversion errors.
//!
//! Wraps collaborator errors unchanged; the converter itself only adds
//! configuration checks.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::preprocess::PreprocessError;
use crate::core::source::SourceError;
use crate::core::store::StorageError;

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    /// Invalid conversion options, detected before any I/O.
    #[error("Invalid conversion options: {0}")]
    #[diagnostic(
        code(brownfield::config),
        help("Check the convert flags or the [conversion] section of the config file")
    )]
    Config(String),

    #[error(transparent)]
    #[diagnostic(
        code(brownfield::source),
        help("Verify the cluster is reachable and the credentials are valid")
    )]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(code(brownfield::storage))]
    Storage(#[from] StorageError),

    #[error(transparent)]
    #[diagnostic(code(brownfield::preprocess))]
    Preprocess(#[from] PreprocessError),
}

impl ConvertError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
