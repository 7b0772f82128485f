//! Source index to document store conversion.
//!
//! One pass over the source index: collect existing migration markers from the
//! target store, scan every record not yet migrated, shape it into a
//! [`Document`], optionally preprocess it, and append the results to the store
//! in fixed-size batches.
//!
//! Batches are not transactional. A failed run leaves the already written
//! prefix in place; with markers enabled, the next run skips that prefix.

pub mod error;
pub mod options;
pub mod report;

use std::time::Instant;

use futures::StreamExt;
use serde_json::{Map, Value};

use crate::core::logging;
use crate::core::models::{Document, NAME_KEY, ORIGINAL_ID_KEY};
use crate::core::preprocess::Preprocessor;
use crate::core::source::{ConnectionConfig, SearchBackend, SearchClient, SearchQuery, SourceIndex, SourceRecord};
use crate::core::store::DocumentStore;

pub use error::{ConvertError, ConvertResult};
pub use options::{ConversionOptions, MetadataSelection, DEFAULT_BATCH_SIZE, DEFAULT_TARGET_INDEX};
pub use report::ConversionReport;

/// Converts the records of one source index into target documents.
pub struct IndexConverter {
    options: ConversionOptions,
    selection: MetadataSelection,
    preprocessor: Option<Box<dyn Preprocessor>>,
    show_progress: bool,
}

impl IndexConverter {
    /// Validate `options`. No I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::Config` for conflicting metadata lists, a zero
    /// batch size or empty index/field names.
    pub fn new(options: ConversionOptions) -> ConvertResult<Self> {
        let selection = options.validate()?;
        Ok(Self {
            options,
            selection,
            preprocessor: None,
            show_progress: false,
        })
    }

    pub fn with_preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    /// Draw a progress bar on interactive terminals.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Shape one source record. Returns `None` when the content field is
    /// missing or empty.
    pub fn shape(&self, record: SourceRecord) -> Option<Document> {
        let SourceRecord { id, mut source } = record;

        let Some(content) = take_content(&mut source, &self.options.content_field) else {
            tracing::debug!(id = %id, field = %self.options.content_field, "Record has no content, skipping");
            return None;
        };

        let name = self
            .options
            .name_field
            .as_ref()
            .and_then(|field| source.remove(field));

        let mut meta = Map::new();
        if let Some(name) = name {
            meta.insert(NAME_KEY.to_string(), name);
        }
        meta.extend(self.selection.select(source));
        if self.options.store_original_ids {
            meta.insert(ORIGINAL_ID_KEY.to_string(), Value::String(id));
        }

        Some(Document::new(content).with_meta(meta))
    }

    /// Run the conversion against `source`, appending to `store`.
    ///
    /// Returns the store handle together with the run report.
    pub async fn run<Src, S>(&self, source: &Src, store: S) -> ConvertResult<(S, ConversionReport)>
    where
        Src: SourceIndex + ?Sized,
        S: DocumentStore,
    {
        let started = Instant::now();
        let source_index = self.options.source_index.as_str();
        let target_index = self.options.target_index();
        let batch_size = self.options.batch_size;

        let mut report = ConversionReport {
            source_index: source_index.to_string(),
            target_index: target_index.to_string(),
            ..ConversionReport::default()
        };

        let markers = store.existing_markers(target_index, ORIGINAL_ID_KEY).await?;
        report.existing_markers = markers.len();
        tracing::info!(
            target_index,
            markers = markers.len(),
            "Collected existing migration markers"
        );

        let query = SearchQuery::excluding_ids(markers);
        let total = source.count(source_index, &query).await?;
        report.matched_records = total;
        tracing::info!(source_index, records = total, "Scanning source index");

        let progress = logging::record_progress(total, "Converting records", self.show_progress);
        let mut records = source.scan(source_index, &query);
        let mut buffer: Vec<Document> = Vec::new();

        while let Some(record) = records.next().await {
            let record = record?;
            report.records_read += 1;
            progress.inc(1);

            let Some(document) = self.shape(record) else {
                report.records_skipped += 1;
                continue;
            };
            report.records_converted += 1;

            match &self.preprocessor {
                Some(preprocessor) => buffer.extend(preprocessor.process(document)?),
                None => buffer.push(document),
            }

            while buffer.len() >= batch_size {
                let rest = buffer.split_off(batch_size);
                let batch = std::mem::replace(&mut buffer, rest);
                write_batch(&store, batch, &mut report).await?;
            }
        }

        if !buffer.is_empty() {
            write_batch(&store, buffer, &mut report).await?;
        }

        progress.finish_and_clear();
        report.elapsed = started.elapsed();

        tracing::info!(
            source_index,
            target_index,
            read = report.records_read,
            skipped = report.records_skipped,
            written = report.documents_written,
            batches = report.batches_written(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Conversion finished"
        );

        Ok((store, report))
    }
}

async fn write_batch<S: DocumentStore>(
    store: &S,
    batch: Vec<Document>,
    report: &mut ConversionReport,
) -> ConvertResult<()> {
    let size = batch.len();
    store.write_documents(batch, &report.target_index).await?;
    report.documents_written += size;
    report.batch_sizes.push(size);
    tracing::info!(
        batch = report.batch_sizes.len(),
        size,
        total = report.documents_written,
        "Batch written"
    );
    Ok(())
}

/// Remove the content field and render it as text.
///
/// Falsy values (`""`, `0`, `false`, null, empty arrays and objects) count as
/// missing content. Other strings are used as-is and other numbers and `true`
/// are rendered. Non-empty arrays and objects have no text form and are
/// skipped as well.
fn take_content(source: &mut Map<String, Value>, field: &str) -> Option<String> {
    match source.remove(field)? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some(true.to_string()),
        _ => None,
    }
}

/// Connect to a search cluster and migrate one of its indexes into `store`.
///
/// Options are validated before the client is built, so configuration
/// conflicts never reach the network.
pub async fn index_to_document_store<S: DocumentStore>(
    store: S,
    backend: SearchBackend,
    connection: &ConnectionConfig,
    options: ConversionOptions,
    preprocessor: Option<Box<dyn Preprocessor>>,
) -> ConvertResult<(S, ConversionReport)> {
    let mut converter = IndexConverter::new(options)?.with_progress(true);
    if let Some(preprocessor) = preprocessor {
        converter = converter.with_preprocessor(preprocessor);
    }

    let client = SearchClient::connect(backend, connection)?;
    tracing::info!(backend = %backend, index = %converter.options().source_index, "Connected to source cluster");

    converter.run(&client, store).await
}
