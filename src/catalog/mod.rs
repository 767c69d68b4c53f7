//! Catalog store.
//!
//! The catalog is the in-memory table of dataset records with their precomputed
//! embeddings. It is loaded once at startup from a [`CatalogSource`] and is
//! read-only afterwards; the service shares it behind an `Arc`.

pub mod json;

use async_trait::async_trait;
use std::ops::Index;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CatalogRecord, EmbeddingConfig};

pub use json::JsonCatalogSource;

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The artifact was built with a different embedding model
    #[error("Embedding config mismatch: {0}")]
    ConfigMismatch(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Trait for sources of precomputed catalog rows.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Read every row, in source order. Rows are not validated.
    async fn fetch_records(&self) -> CatalogResult<Vec<CatalogRecord>>;

    /// Embedding configuration the rows were built with, if the source records one.
    async fn embedding_config(&self) -> CatalogResult<Option<EmbeddingConfig>>;

    /// Human-readable name of the source, for logging.
    fn name(&self) -> &str;
}

/// Counters from a catalog load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub total_rows: usize,
    pub loaded: usize,
    /// Rows missing a description or therapeutic-area coverage
    pub dropped_incomplete: usize,
    /// Rows whose embedding length differs from the catalog dimension
    pub dropped_malformed: usize,
}

/// Immutable, order-preserving collection of catalog records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Arc<[CatalogRecord]>,
    config: Option<EmbeddingConfig>,
}

impl Catalog {
    /// Load and validate records from a source.
    ///
    /// Rows failing the description/coverage invariant are dropped. When the
    /// source records an embedding config, rows whose vector length does not
    /// match its dimension are dropped too.
    pub async fn load<S: CatalogSource + ?Sized>(source: &S) -> CatalogResult<(Self, LoadStats)> {
        let config = source.embedding_config().await?;
        let rows = source.fetch_records().await?;
        let (catalog, stats) = Self::from_records(rows, config);

        info!(
            "Loaded {} catalog records from {} ({} incomplete, {} malformed rows dropped)",
            stats.loaded,
            source.name(),
            stats.dropped_incomplete,
            stats.dropped_malformed
        );
        Ok((catalog, stats))
    }

    /// Build a catalog from in-memory rows, applying the load-time invariants.
    pub fn from_records(
        rows: Vec<CatalogRecord>,
        config: Option<EmbeddingConfig>,
    ) -> (Self, LoadStats) {
        let mut stats = LoadStats {
            total_rows: rows.len(),
            ..Default::default()
        };
        let dimension = config.as_ref().map(|c| c.dimension);

        let records: Vec<CatalogRecord> = rows
            .into_iter()
            .enumerate()
            .filter(|(row, record)| {
                if !record.is_complete() {
                    debug!("Dropping catalog row {}: missing description or TA coverage", row);
                    stats.dropped_incomplete += 1;
                    return false;
                }
                if let Some(dim) = dimension {
                    if record.embedding.len() != dim {
                        debug!(
                            "Dropping catalog row {}: embedding has {} dimensions, expected {}",
                            row,
                            record.embedding.len(),
                            dim
                        );
                        stats.dropped_malformed += 1;
                        return false;
                    }
                }
                true
            })
            .map(|(_, record)| record)
            .collect();

        stats.loaded = records.len();
        (
            Self {
                records: records.into(),
                config,
            },
            stats,
        )
    }

    /// Check that the catalog was built with the given embedding model.
    ///
    /// Catalogs without a recorded config always pass.
    pub fn ensure_compatible(&self, model_name: &str, dimension: usize) -> CatalogResult<()> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        if config.dimension != dimension {
            return Err(CatalogError::ConfigMismatch(format!(
                "catalog embeddings have {} dimensions but provider '{}' produces {}",
                config.dimension, model_name, dimension
            )));
        }
        if !config.model_name.eq_ignore_ascii_case(model_name) {
            return Err(CatalogError::ConfigMismatch(format!(
                "catalog was built with '{}' but provider is '{}'",
                config.model_name, model_name
            )));
        }
        Ok(())
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&CatalogRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> Option<&EmbeddingConfig> {
        self.config.as_ref()
    }
}

impl Index<usize> for Catalog {
    type Output = CatalogRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogRecord;
    type IntoIter = std::slice::Iter<'a, CatalogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, description: Option<&str>, ta: Option<&str>, embedding: Vec<f32>) -> CatalogRecord {
        CatalogRecord {
            dataset_name: Some(name.to_string()),
            description: description.map(str::to_string),
            ta_coverage: ta.map(str::to_string),
            embedding,
            ..Default::default()
        }
    }

    fn config(dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            model_name: "all-MiniLM-L6-v2".to_string(),
            dimension,
        }
    }

    struct StaticSource(Vec<CatalogRecord>, Option<EmbeddingConfig>);

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch_records(&self) -> CatalogResult<Vec<CatalogRecord>> {
            Ok(self.0.clone())
        }

        async fn embedding_config(&self) -> CatalogResult<Option<EmbeddingConfig>> {
            Ok(self.1.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    #[test]
    fn test_drops_incomplete_rows_and_keeps_order() {
        let rows = vec![
            row("a", Some("desc"), Some("oncology"), vec![]),
            row("b", None, Some("oncology"), vec![]),
            row("c", Some("desc"), None, vec![]),
            row("d", Some("desc"), Some("cardiology"), vec![]),
        ];

        let (catalog, stats) = Catalog::from_records(rows, None);
        let names: Vec<_> = catalog.iter().map(|r| r.dataset_name.as_deref().unwrap()).collect();

        assert_eq!(names, vec!["a", "d"]);
        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.dropped_incomplete, 2);
        assert_eq!(stats.loaded, 2);
        assert_eq!(catalog[1].dataset_name.as_deref(), Some("d"));
    }

    #[test]
    fn test_drops_wrong_dimension_when_config_known() {
        let rows = vec![
            row("a", Some("desc"), Some("ta"), vec![0.1, 0.2]),
            row("b", Some("desc"), Some("ta"), vec![0.1]),
        ];

        let (catalog, stats) = Catalog::from_records(rows, Some(config(2)));
        assert_eq!(catalog.len(), 1);
        assert_eq!(stats.dropped_malformed, 1);
    }

    #[test]
    fn test_ensure_compatible() {
        let (catalog, _) = Catalog::from_records(vec![], Some(config(384)));
        assert!(catalog.ensure_compatible("all-MiniLM-L6-v2", 384).is_ok());
        assert!(matches!(
            catalog.ensure_compatible("all-MiniLM-L6-v2", 768),
            Err(CatalogError::ConfigMismatch(_))
        ));
        assert!(matches!(
            catalog.ensure_compatible("bge-small-en-v1.5", 384),
            Err(CatalogError::ConfigMismatch(_))
        ));

        let (bare, _) = Catalog::from_records(vec![], None);
        assert!(bare.ensure_compatible("anything", 3).is_ok());
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let source = StaticSource(
            vec![
                row("a", Some("desc"), Some("ta"), vec![1.0, 0.0]),
                row("b", Some(""), Some("ta"), vec![1.0, 0.0]),
            ],
            Some(config(2)),
        );

        let (catalog, stats) = Catalog::load(&source).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(stats.dropped_incomplete, 1);
        assert_eq!(catalog.config(), Some(&config(2)));
        assert!(catalog.get(1).is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.records().len(), 0);
    }
}
