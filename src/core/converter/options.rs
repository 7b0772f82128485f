//! Conversion options and metadata field selection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ConvertError, ConvertResult};

/// Default number of documents per write.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Target index used when none is given.
pub const DEFAULT_TARGET_INDEX: &str = "documents";

/// Which source fields end up in `meta`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "fields")]
pub enum MetadataSelection {
    /// Every remaining field
    #[default]
    All,
    /// Only the listed fields that exist
    Include(Vec<String>),
    /// Every remaining field except the listed ones
    Exclude(Vec<String>),
}

impl MetadataSelection {
    /// Build from the two optional caller lists.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::Config` when both lists are supplied.
    pub fn from_lists(
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> ConvertResult<Self> {
        match (include, exclude) {
            (Some(_), Some(_)) => Err(ConvertError::config(
                "included_metadata_fields and excluded_metadata_fields are mutually exclusive",
            )),
            (Some(fields), None) => Ok(Self::Include(fields)),
            (None, Some(fields)) => Ok(Self::Exclude(fields)),
            (None, None) => Ok(Self::All),
        }
    }

    /// Pick metadata out of the remaining source fields.
    pub fn select(&self, mut fields: Map<String, Value>) -> Map<String, Value> {
        match self {
            Self::All => fields,
            Self::Include(keep) => {
                let mut selected = Map::new();
                for name in keep {
                    if let Some(value) = fields.remove(name) {
                        selected.insert(name.clone(), value);
                    }
                }
                selected
            }
            Self::Exclude(drop) => {
                for name in drop {
                    fields.remove(name);
                }
                fields
            }
        }
    }
}

/// Parameters of one conversion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Source index to read
    pub source_index: String,
    /// Source field whose text becomes the document content
    pub content_field: String,
    /// Optional source field stored as `meta.name`
    pub name_field: Option<String>,
    pub included_metadata_fields: Option<Vec<String>>,
    pub excluded_metadata_fields: Option<Vec<String>>,
    /// Store the source id as a migration marker
    pub store_original_ids: bool,
    /// Target index; falls back to [`DEFAULT_TARGET_INDEX`]
    pub target_index: Option<String>,
    pub batch_size: usize,
}

impl ConversionOptions {
    pub fn new(source_index: impl Into<String>, content_field: impl Into<String>) -> Self {
        Self {
            source_index: source_index.into(),
            content_field: content_field.into(),
            name_field: None,
            included_metadata_fields: None,
            excluded_metadata_fields: None,
            store_original_ids: true,
            target_index: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = Some(field.into());
        self
    }

    pub fn include_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_metadata_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_metadata_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn store_original_ids(mut self, store: bool) -> Self {
        self.store_original_ids = store;
        self
    }

    pub fn with_target_index(mut self, index: impl Into<String>) -> Self {
        self.target_index = Some(index.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Effective target index name.
    pub fn target_index(&self) -> &str {
        self.target_index.as_deref().unwrap_or(DEFAULT_TARGET_INDEX)
    }

    /// Check the options and derive the metadata selection.
    pub fn validate(&self) -> ConvertResult<MetadataSelection> {
        if self.source_index.trim().is_empty() {
            return Err(ConvertError::config("source index name is empty"));
        }
        if self.content_field.trim().is_empty() {
            return Err(ConvertError::config("content field is empty"));
        }
        if self.batch_size == 0 {
            return Err(ConvertError::config("batch_size must be at least 1"));
        }
        if self.target_index().trim().is_empty() {
            return Err(ConvertError::config("target index name is empty"));
        }

        MetadataSelection::from_lists(
            self.included_metadata_fields.clone(),
            self.excluded_metadata_fields.clone(),
        )
    }
}
