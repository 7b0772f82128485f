//! Target document stores.
//!
//! The converter writes through the [`DocumentStore`] trait. Stores only
//! append; deduplication of already migrated records is done by the converter
//! using the markers returned from [`DocumentStore::existing_markers`].
//!
//! # Implementations
//!
//! - [`InMemoryDocumentStore`] - process-local store, used in tests and dry runs
//! - [`SurrealDocumentStore`] - embedded SurrealDB (RocksDB on disk, or in-memory)

pub mod error;
pub mod memory;
pub mod surreal;

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde_json::Value;

use crate::core::models::Document;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryDocumentStore;
pub use surreal::{SurrealDocumentStore, SurrealStoreConfig};

/// Append-only document storage keyed by index name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stream every document stored under `index`.
    fn get_all_documents<'a>(&'a self, index: &'a str) -> BoxStream<'a, StorageResult<Document>>;

    /// Append `documents` to `index`. No deduplication is performed.
    async fn write_documents(&self, documents: Vec<Document>, index: &str) -> StorageResult<()>;

    /// Number of documents stored under `index`.
    async fn count_documents(&self, index: &str) -> StorageResult<usize>;

    /// Collect the string values stored under `meta[key]` across `index`.
    ///
    /// The default walks [`get_all_documents`](Self::get_all_documents) and
    /// keeps only the marker values. Stores that can project a single field
    /// server-side should override it.
    async fn existing_markers(&self, index: &str, key: &str) -> StorageResult<HashSet<String>> {
        self.get_all_documents(index)
            .try_fold(HashSet::new(), |mut markers, doc| async move {
                if let Some(Value::String(marker)) = doc.meta.get(key) {
                    markers.insert(marker.clone());
                }
                Ok(markers)
            })
            .await
    }
}
