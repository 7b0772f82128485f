//! In-memory source index.
//!
//! Holds records per index name and evaluates queries locally. Used for tests
//! and for replaying exported hits without a running cluster.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;

use super::error::{SourceError, SourceResult};
use super::query::SearchQuery;
use super::record::SourceRecord;
use super::SourceIndex;

#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    indexes: HashMap<String, Vec<SourceRecord>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HitDump {
    Hits(Vec<SourceRecord>),
    Response { hits: Nested },
}

#[derive(Deserialize)]
struct Nested {
    hits: Vec<SourceRecord>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to an index, creating it if needed.
    pub fn with_records(
        mut self,
        index: impl Into<String>,
        records: impl IntoIterator<Item = SourceRecord>,
    ) -> Self {
        self.insert(index, records);
        self
    }

    pub fn insert(
        &mut self,
        index: impl Into<String>,
        records: impl IntoIterator<Item = SourceRecord>,
    ) {
        self.indexes.entry(index.into()).or_default().extend(records);
    }

    /// Load hits exported from a search response.
    ///
    /// Accepts either a bare array of hits or a full `_search` response body.
    pub fn load_json(&mut self, index: impl Into<String>, path: &Path) -> SourceResult<usize> {
        let raw = std::fs::read_to_string(path)?;
        let records = match serde_json::from_str::<HitDump>(&raw)? {
            HitDump::Hits(hits) => hits,
            HitDump::Response { hits } => hits.hits,
        };
        let loaded = records.len();
        self.insert(index, records);
        Ok(loaded)
    }

    fn records(&self, index: &str) -> SourceResult<&[SourceRecord]> {
        self.indexes
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::Request {
                status: 404,
                reason: format!("no such index [{}]", index),
            })
    }
}

#[async_trait]
impl SourceIndex for InMemorySource {
    async fn count(&self, index: &str, query: &SearchQuery) -> SourceResult<u64> {
        let records = self.records(index)?;
        Ok(records.iter().filter(|r| query.matches(r)).count() as u64)
    }

    fn scan<'a>(
        &'a self,
        index: &'a str,
        query: &'a SearchQuery,
    ) -> BoxStream<'a, SourceResult<SourceRecord>> {
        match self.records(index) {
            Ok(records) => stream::iter(records.iter().filter(move |r| query.matches(r)))
                .map(|r| Ok(r.clone()))
                .boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}
