//! Shared document model.
//!
//! A [`Document`] is the normalized shape every migrated record takes before it
//! is handed to a [`DocumentStore`](crate::core::store::DocumentStore).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key holding the identifier a record had in the source index.
///
/// Present only when the conversion ran with `store_original_ids` enabled.
/// Later runs read these values back to skip records that were already migrated.
pub const ORIGINAL_ID_KEY: &str = "_original_es_id";

/// Metadata key holding the display name extracted from the source record.
pub const NAME_KEY: &str = "name";

/// Metadata key set by the splitter on each produced chunk.
pub const SPLIT_ID_KEY: &str = "_split_id";

/// A shaped document ready to be written to a target store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-level identifier (fresh UUID v4 per produced document)
    pub id: String,
    /// Text content
    pub content: String,
    /// Metadata mapping
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Document {
    /// Create a document with a fresh id and empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            meta: Map::new(),
        }
    }

    /// Replace the metadata mapping.
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Set a single metadata entry.
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Display name stored under `meta.name`, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.meta.get(NAME_KEY).and_then(Value::as_str)
    }

    /// Migration marker, if this document was produced with markers enabled.
    pub fn original_id(&self) -> Option<&str> {
        self.meta.get(ORIGINAL_ID_KEY).and_then(Value::as_str)
    }
}
