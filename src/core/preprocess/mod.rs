//! Document preprocessing applied between shaping and writing.
//!
//! A preprocessor turns one shaped document into zero or more documents,
//! e.g. by cleaning and chunking its text.

pub mod error;
pub mod splitter;

pub use error::{PreprocessError, PreprocessResult};
pub use splitter::{DocumentSplitter, SplitBy, SplitterConfig};

use crate::core::models::Document;

#[cfg_attr(test, mockall::automock)]
pub trait Preprocessor: Send + Sync {
    /// Transform one document into 0..n documents.
    fn process(&self, document: Document) -> PreprocessResult<Vec<Document>>;
}
