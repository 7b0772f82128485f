//! Process-local document store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;

use super::{DocumentStore, StorageResult};
use crate::core::models::Document;

/// Documents held in memory, grouped by index name.
///
/// Clones share the same underlying storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    indexes: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the documents under `index`, in write order.
    pub async fn documents(&self, index: &str) -> Vec<Document> {
        self.indexes
            .read()
            .await
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn get_all_documents<'a>(&'a self, index: &'a str) -> BoxStream<'a, StorageResult<Document>> {
        stream::once(self.documents(index))
            .flat_map(|docs| stream::iter(docs.into_iter().map(Ok)))
            .boxed()
    }

    async fn write_documents(&self, documents: Vec<Document>, index: &str) -> StorageResult<()> {
        self.indexes
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }

    async fn count_documents(&self, index: &str) -> StorageResult<usize> {
        Ok(self
            .indexes
            .read()
            .await
            .get(index)
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ORIGINAL_ID_KEY;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_write_then_read_in_order() {
        let store = InMemoryDocumentStore::new();
        store
            .write_documents(vec![Document::new("a"), Document::new("b")], "docs")
            .await
            .unwrap();
        store
            .write_documents(vec![Document::new("c")], "docs")
            .await
            .unwrap();

        let contents: Vec<String> = store
            .get_all_documents("docs")
            .map_ok(|d| d.content)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(contents, vec!["a", "b", "c"]);
        assert_eq!(store.count_documents("docs").await.unwrap(), 3);
        assert_eq!(store.count_documents("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_markers_default_impl() {
        let store = InMemoryDocumentStore::new();
        store
            .write_documents(
                vec![
                    Document::new("a").with_meta_entry(ORIGINAL_ID_KEY, "1"),
                    Document::new("b"),
                    Document::new("c").with_meta_entry(ORIGINAL_ID_KEY, "3"),
                    Document::new("d").with_meta_entry(ORIGINAL_ID_KEY, 4),
                ],
                "docs",
            )
            .await
            .unwrap();

        let markers = store.existing_markers("docs", ORIGINAL_ID_KEY).await.unwrap();
        assert_eq!(markers.len(), 2);
        assert!(markers.contains("1") && markers.contains("3"));
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = InMemoryDocumentStore::new();
        let handle = store.clone();
        handle
            .write_documents(vec![Document::new("x")], "docs")
            .await
            .unwrap();
        assert_eq!(store.documents("docs").await.len(), 1);
    }
}
