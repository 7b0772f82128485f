//! Run summary.

use std::time::Duration;

use serde::Serialize;

/// Counters collected during one conversion run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub source_index: String,
    pub target_index: String,
    /// Markers already present in the target index before the run
    pub existing_markers: usize,
    /// Source count for the deduplicated query
    pub matched_records: u64,
    /// Records read from the scan
    pub records_read: usize,
    /// Records with usable content, handed to the preprocessor or buffered
    pub records_converted: usize,
    /// Records skipped because the content field was empty or missing
    pub records_skipped: usize,
    pub documents_written: usize,
    /// Size of every write, in order
    pub batch_sizes: Vec<usize>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl ConversionReport {
    pub fn batches_written(&self) -> usize {
        self.batch_sizes.len()
    }

    /// Multi-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Source index:       {}\n\
             Target index:       {}\n\
             Existing markers:   {}\n\
             Records read:       {}\n\
             Records converted:  {}\n\
             Records skipped:    {}\n\
             Documents written:  {}\n\
             Batches:            {}\n\
             Elapsed:            {:.2}s",
            self.source_index,
            self.target_index,
            self.existing_markers,
            self.records_read,
            self.records_converted,
            self.records_skipped,
            self.documents_written,
            self.batches_written(),
            self.elapsed.as_secs_f64()
        )
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
