//! Raw row sources for the ingestion pipeline.
//!
//! The `RowSource` trait abstracts where un-embedded catalog rows come from, so
//! the ingestion pipeline can work with different exports (JSON files today)
//! without coupling to one format.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::CatalogRecord;

pub mod json;

pub use json::JsonRowSource;

/// Errors that can occur when reading raw rows.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Trait for sources of raw catalog rows.
///
/// # Design Notes
///
/// - Rows are returned without embeddings; the ingestion pipeline generates them
/// - Rows are not validated; incomplete rows are dropped by the pipeline
/// - Source order is preserved, since it becomes the catalog's scan order
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every row from this source, in source order.
    async fn fetch_rows(&self) -> SourceResult<Vec<CatalogRecord>>;

    /// Fetch at most `limit` rows, useful for trial runs.
    async fn fetch_rows_limit(&self, limit: usize) -> SourceResult<Vec<CatalogRecord>> {
        let rows = self.fetch_rows().await?;
        Ok(rows.into_iter().take(limit).collect())
    }

    /// Total number of rows available.
    async fn count_rows(&self) -> SourceResult<usize> {
        self.fetch_rows().await.map(|rows| rows.len())
    }

    /// Human-readable name of this source, for logging.
    fn name(&self) -> &str;
}
