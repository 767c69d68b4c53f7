//! Catalog Search - semantic search over a catalog of dataset descriptions.
//!
//! Given a free-text query, the service returns the catalog entries that best
//! match it, ranked by embedding similarity and adjusted by two heuristics:
//! entity-based filtering and data-quality penalties.
//!
//! # Architecture
//!
//! - **models**: Core data structures (CatalogRecord, QueryFactors, ScoredRecord)
//! - **embedding**: Text embedding generation (fastembed) and query normalization
//! - **extraction**: Entity recognition and query factor extraction
//! - **catalog**: The in-memory catalog and its artifact loader
//! - **query**: Ranking engine (similarity, penalties, filter/fallback selection)
//! - **service**: Request boundary (validation, timeout, outcome)
//! - **server**: axum HTTP API
//! - **source** / **ingestion**: Offline artifact building
//!
//! # Workflow
//!
//! ## Offline Ingestion
//!
//! 1. Read raw rows from a source export
//! 2. Drop rows without a description or therapeutic-area coverage
//! 3. Embed the concatenated descriptive columns in batches
//! 4. Write the records, vectors and embedding config as a JSON artifact
//!
//! ## Online Search
//!
//! 1. Validate and normalize the query
//! 2. Extract geographic and thematic factors
//! 3. Score every record against the query
//! 4. Subtract placeholder penalties
//! 5. Filter by factors, falling back to the whole catalog
//! 6. Return the top-k records
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_search::catalog::{Catalog, JsonCatalogSource};
//! use catalog_search::embedding::fastembed::FastEmbedProvider;
//! use catalog_search::extraction::FactorExtractor;
//! use catalog_search::query::RankingEngine;
//! use catalog_search::service::{QueryService, SearchOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = JsonCatalogSource::from_file("processed_data_with_embeddings.json").await?;
//!     let (catalog, _) = Catalog::load(&source).await?;
//!     let engine = RankingEngine::new(FastEmbedProvider::new(None, None)?);
//!     let service = QueryService::new(catalog, FactorExtractor::default(), engine);
//!
//!     if let SearchOutcome::Results(results) = service.search(Some("COVID-19 datasets in France")).await? {
//!         for result in results {
//!             println!("{:?}: {:.3}", result.record.dataset_name, result.penalized_similarity);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod embedding;
pub mod extraction;
pub mod ingestion;
pub mod models;
pub mod query;
pub mod server;
pub mod service;
pub mod source;

// Re-export commonly used types at the crate root
pub use catalog::{Catalog, CatalogSource};
pub use embedding::EmbeddingProvider;
pub use extraction::{EntityRecognizer, FactorExtractor, FactorStrategy};
pub use models::{CatalogRecord, EmbeddingConfig, QueryFactors, ScoredRecord};
pub use query::{Ranker, RankingEngine, ScoringMode};
pub use service::{QueryService, SearchOutcome, ServiceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
