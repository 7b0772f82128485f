//! Source index access.
//!
//! The converter reads records through the [`SourceIndex`] trait. Two
//! implementations ship with the crate: [`SearchClient`] talks HTTP to an
//! Elasticsearch or OpenSearch cluster, [`InMemorySource`] serves records held
//! in memory.

pub mod backend;
pub mod client;
pub mod error;
pub mod filter;
pub mod memory;
pub mod query;
pub mod record;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use backend::{
    Auth, ConnectionConfig, Credentials, Scheme, SearchBackend, DEFAULT_SCROLL_KEEP_ALIVE,
    DEFAULT_SCROLL_PAGE_SIZE,
};
pub use client::{ClusterInfo, SearchClient};
pub use error::{SourceError, SourceResult};
pub use filter::{CompareOp, Filter};
pub use memory::InMemorySource;
pub use query::SearchQuery;
pub use record::SourceRecord;

/// Read access to a search index.
#[async_trait]
pub trait SourceIndex: Send + Sync {
    /// Number of records in `index` matching `query`.
    async fn count(&self, index: &str, query: &SearchQuery) -> SourceResult<u64>;

    /// Lazily stream every record in `index` matching `query`.
    ///
    /// Errors are yielded in-stream; the stream ends after the first error.
    fn scan<'a>(
        &'a self,
        index: &'a str,
        query: &'a SearchQuery,
    ) -> BoxStream<'a, SourceResult<SourceRecord>>;
}
