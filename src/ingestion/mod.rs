//! Ingestion pipeline module.
//!
//! Builds the catalog artifact offline: raw rows are validated, their
//! descriptive columns concatenated and embedded in batches, and the result is
//! paired with the provider's embedding configuration.
//!
//! ```rust,no_run
//! use catalog_search::catalog::json::write_artifact;
//! use catalog_search::embedding::fastembed::FastEmbedProvider;
//! use catalog_search::ingestion::CatalogBuilder;
//! use catalog_search::source::JsonRowSource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = JsonRowSource::from_file("genai_data.json").await?;
//! let builder = CatalogBuilder::new(FastEmbedProvider::new(None, None)?, None);
//!
//! let (artifact, stats) = builder.build_from_source(&source).await?;
//! write_artifact("processed_data_with_embeddings.json", &artifact).await?;
//! println!("Kept {}, dropped {}", stats.kept, stats.dropped_incomplete);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::{debug, info};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::models::{CatalogArtifact, CatalogRecord, Column, EmbeddingConfig};
use crate::source::{RowSource, SourceError};

/// Default number of rows embedded per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Reading raw rows failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The provider returned vectors that do not line up with the batch
    #[error("Invalid embedding output: {0}")]
    InvalidOutput(String),
}

/// Result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Statistics from an ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Total number of input rows
    pub total_rows: usize,

    /// Rows embedded and written to the artifact
    pub kept: usize,

    /// Rows missing a description or therapeutic-area coverage
    pub dropped_incomplete: usize,

    /// Provider calls made
    pub batches: usize,
}

impl IngestionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kept(&mut self, count: usize) {
        self.total_rows += count;
        self.kept += count;
    }

    pub fn record_dropped(&mut self) {
        self.total_rows += 1;
        self.dropped_incomplete += 1;
    }
}

/// Canonical text embedded for a record: its descriptive columns joined by
/// single spaces, missing values contributing an empty string.
pub fn concatenate(record: &CatalogRecord) -> String {
    record.join_columns(&Column::EMBEDDED)
}

/// Offline catalog builder.
pub struct CatalogBuilder<E>
where
    E: EmbeddingProvider,
{
    embedding_provider: E,
    batch_size: usize,
}

impl<E> CatalogBuilder<E>
where
    E: EmbeddingProvider,
{
    /// Create a builder. `batch_size` defaults to 100; zero is treated as one.
    pub fn new(embedding_provider: E, batch_size: Option<usize>) -> Self {
        Self {
            embedding_provider,
            batch_size: batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embedding configuration recorded in the artifact.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model_name: self.embedding_provider.model_name().to_string(),
            dimension: self.embedding_provider.dimension(),
        }
    }

    /// Build an artifact from raw rows.
    pub async fn build(&self, rows: Vec<CatalogRecord>) -> IngestionResult<(CatalogArtifact, IngestionStats)> {
        self.build_with_progress(rows, |_| {}).await
    }

    /// Build an artifact, calling `on_batch` with the number of rows embedded
    /// after each provider call.
    ///
    /// # Errors
    /// Any embedding failure aborts the run; no partial artifact is produced.
    pub async fn build_with_progress<F>(
        &self,
        rows: Vec<CatalogRecord>,
        mut on_batch: F,
    ) -> IngestionResult<(CatalogArtifact, IngestionStats)>
    where
        F: FnMut(usize),
    {
        let mut stats = IngestionStats::new();

        let mut records: Vec<CatalogRecord> = Vec::with_capacity(rows.len());
        for (row, record) in rows.into_iter().enumerate() {
            if record.is_complete() {
                records.push(record);
            } else {
                debug!("Dropping row {}: missing description or TA coverage", row);
                stats.record_dropped();
            }
        }

        let dimension = self.embedding_provider.dimension();
        for chunk in records.chunks_mut(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(concatenate).collect();
            let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

            let embeddings = self.embedding_provider.embed_batch(&text_refs).await?;
            stats.batches += 1;

            if embeddings.len() != chunk.len() {
                return Err(IngestionError::InvalidOutput(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }

            for (record, embedding) in chunk.iter_mut().zip(embeddings) {
                if embedding.len() != dimension {
                    return Err(IngestionError::InvalidOutput(format!(
                        "expected {} dimensions, got {}",
                        dimension,
                        embedding.len()
                    )));
                }
                record.embedding = embedding;
            }

            stats.record_kept(chunk.len());
            on_batch(chunk.len());
        }

        info!(
            "Built catalog with {} records ({} dropped) in {} batches",
            stats.kept, stats.dropped_incomplete, stats.batches
        );

        Ok((
            CatalogArtifact {
                config: self.embedding_config(),
                records,
            },
            stats,
        ))
    }

    /// Fetch every row from a source and build an artifact from it.
    pub async fn build_from_source<S>(&self, source: &S) -> IngestionResult<(CatalogArtifact, IngestionStats)>
    where
        S: RowSource + ?Sized,
    {
        let rows = source.fetch_rows().await?;
        info!("Fetched {} rows from {}", rows.len(), source.name());
        self.build(rows).await
    }
}
