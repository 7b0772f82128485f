//! Embedded SurrealDB document store.
//!
//! Each index maps to a SurrealDB table. Documents are stored as
//! `{table}:{id}` records with `content` and `metadata` fields. The store is
//! schemaless so arbitrary source metadata survives unchanged.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

use super::{DocumentStore, StorageError, StorageResult};
use crate::core::models::Document;

/// Documents fetched per page by [`SurrealDocumentStore::get_all_documents`].
const READ_PAGE_SIZE: usize = 1_000;

/// Namespace/database selection for the embedded instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurrealStoreConfig {
    /// SurrealDB namespace (default: "brownfield")
    pub namespace: String,
    /// SurrealDB database name (default: "documents")
    pub database: String,
}

impl Default for SurrealStoreConfig {
    fn default() -> Self {
        Self {
            namespace: "brownfield".to_string(),
            database: "documents".to_string(),
        }
    }
}

#[derive(Serialize)]
struct StoredDocument {
    id: String,
    content: String,
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct DocumentRow {
    id: String,
    content: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            content: row.content,
            meta: row.metadata,
        }
    }
}

/// Document store backed by an embedded SurrealDB instance.
#[derive(Clone)]
pub struct SurrealDocumentStore {
    db: Arc<Surreal<Db>>,
    config: SurrealStoreConfig,
}

impl SurrealDocumentStore {
    /// Open (or create) a RocksDB-backed store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Init` if the directory cannot be created and
    /// `StorageError::Database` if the connection or namespace selection fails.
    pub async fn open(db_path: impl AsRef<Path>, config: SurrealStoreConfig) -> StorageResult<Self> {
        let db_path: PathBuf = db_path.as_ref().to_path_buf();
        if !db_path.exists() {
            std::fs::create_dir_all(&db_path).map_err(|e| {
                StorageError::init(format!(
                    "Failed to create database directory at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;
        }

        let db = Surreal::new::<RocksDb>(db_path.clone())
            .await
            .map_err(|e| StorageError::database(format!("Failed to connect to SurrealDB: {}", e)))?;

        let store = Self::select(db, config).await?;
        tracing::info!(
            path = %db_path.display(),
            namespace = %store.config.namespace,
            database = %store.config.database,
            "SurrealDB document store opened"
        );
        Ok(store)
    }

    /// Create a store that lives only in memory.
    pub async fn in_memory(config: SurrealStoreConfig) -> StorageResult<Self> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| StorageError::database(format!("Failed to start in-memory SurrealDB: {}", e)))?;

        let store = Self::select(db, config).await?;
        tracing::debug!(namespace = %store.config.namespace, "In-memory SurrealDB document store started");
        Ok(store)
    }

    async fn select(db: Surreal<Db>, config: SurrealStoreConfig) -> StorageResult<Self> {
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StorageError::database(format!("Failed to select namespace/database: {}", e))
            })?;

        Ok(Self {
            db: Arc::new(db),
            config,
        })
    }

    pub fn config(&self) -> &SurrealStoreConfig {
        &self.config
    }

    /// Direct database handle for ad-hoc queries.
    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    async fn read_page(&self, table: &str, start: usize) -> StorageResult<Vec<Document>> {
        let rows: Vec<DocumentRow> = self
            .db
            .query(
                "SELECT record::id(id) AS id, content, metadata FROM type::table($table) \
                 ORDER BY id LIMIT $limit START $start",
            )
            .bind(("table", table.to_string()))
            .bind(("limit", READ_PAGE_SIZE))
            .bind(("start", start))
            .await
            .map_err(|e| StorageError::query(format!("Failed to read documents: {}", e)))?
            .take(0)
            .map_err(|e| StorageError::query(format!("Failed to decode documents: {}", e)))?;

        Ok(rows.into_iter().map(Document::from).collect())
    }
}

#[async_trait]
impl DocumentStore for SurrealDocumentStore {
    fn get_all_documents<'a>(&'a self, index: &'a str) -> BoxStream<'a, StorageResult<Document>> {
        Box::pin(stream! {
            if let Err(e) = validate_identifier(index) {
                yield Err(e);
                return;
            }

            let mut start = 0;
            loop {
                let page = match self.read_page(index, start).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };
                let fetched = page.len();
                for doc in page {
                    yield Ok(doc);
                }
                if fetched < READ_PAGE_SIZE {
                    break;
                }
                start += fetched;
            }
        })
    }

    async fn write_documents(&self, documents: Vec<Document>, index: &str) -> StorageResult<()> {
        validate_identifier(index)?;
        if documents.is_empty() {
            return Ok(());
        }

        let count = documents.len();
        let rows: Vec<StoredDocument> = documents
            .into_iter()
            .map(|doc| StoredDocument {
                id: doc.id,
                content: doc.content,
                metadata: doc.meta,
            })
            .collect();

        self.db
            .query(
                r#"
                FOR $doc IN $documents {
                    CREATE type::thing($table, $doc.id) CONTENT {
                        content: $doc.content,
                        metadata: $doc.metadata,
                        created_at: time::now()
                    };
                };
            "#,
            )
            .bind(("table", index.to_string()))
            .bind(("documents", rows))
            .await
            .map_err(|e| StorageError::database(format!("Failed to write documents: {}", e)))?
            .check()
            .map_err(|e| StorageError::database(format!("Failed to write documents: {}", e)))?;

        tracing::debug!(index, count, "Documents written to SurrealDB");
        Ok(())
    }

    async fn count_documents(&self, index: &str) -> StorageResult<usize> {
        #[derive(Deserialize)]
        struct CountResult {
            count: i64,
        }

        validate_identifier(index)?;
        let result: Option<CountResult> = self
            .db
            .query("SELECT count() AS count FROM type::table($table) GROUP ALL")
            .bind(("table", index.to_string()))
            .await
            .map_err(|e| StorageError::query(format!("Failed to count documents: {}", e)))?
            .take(0)
            .map_err(|e| StorageError::query(format!("Failed to extract count: {}", e)))?;

        Ok(result.map(|r| r.count.max(0) as usize).unwrap_or(0))
    }

    /// Projects the marker field server-side instead of loading whole documents.
    async fn existing_markers(&self, index: &str, key: &str) -> StorageResult<HashSet<String>> {
        validate_identifier(index)?;
        validate_identifier(key)?;

        let query = format!(
            "SELECT VALUE metadata.{key} FROM type::table($table) \
             WHERE type::is::string(metadata.{key})"
        );
        let markers: Vec<String> = self
            .db
            .query(query)
            .bind(("table", index.to_string()))
            .await
            .map_err(|e| StorageError::query(format!("Failed to read markers: {}", e)))?
            .take(0)
            .map_err(|e| StorageError::query(format!("Failed to decode markers: {}", e)))?;

        Ok(markers.into_iter().collect())
    }
}

/// Table and field names are interpolated into SurrealQL in places, so only
/// plain identifiers are accepted.
fn validate_identifier(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StorageError::config(format!(
            "invalid index or field name '{}': use letters, digits and underscores",
            name
        )))
    }
}
