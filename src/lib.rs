//! brownfield - migrate Elasticsearch/OpenSearch indexes into document stores
//!
//! Reads every record of a source index that has not been migrated yet,
//! shapes it into a document and appends it to a target store in batches.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub use crate::core::converter::{
    index_to_document_store, ConversionOptions, ConversionReport, ConvertError, IndexConverter,
    MetadataSelection,
};
pub use crate::core::models::{Document, ORIGINAL_ID_KEY};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
