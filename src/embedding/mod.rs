//! Embedding provider abstraction and implementations.
//!
//! This module defines the interface for text embedding generation. The ranking
//! engine and the ingestion pipeline only see the trait, so the model backend can
//! be swapped (or faked in tests) without touching the core logic.

pub mod fastembed;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding backend could not be loaded or reached
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Invalid input text
    #[error("Invalid input text: {0}")]
    InvalidInput(String),

    /// Inference ran but produced an unusable result
    #[error("Embedding generation failed: {0}")]
    Generation(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Trait for text embedding providers.
///
/// Implementations must be deterministic for a fixed model: the same text yields
/// the same vector whether it is embedded alone or as part of a batch.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single non-empty text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for multiple texts in a single batch.
    ///
    /// Returns one vector per input, in input order. Empty strings are valid
    /// members of a batch.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Number of dimensions in the embedding vectors.
    fn dimension(&self) -> usize;

    /// Identifier of the embedding model (e.g., "all-MiniLM-L6-v2").
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<T> {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        (**self).embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Normalizes a raw user query before extraction and embedding.
///
/// Lowercases and trims leading/trailing whitespace; inner spacing is kept so
/// substring matching against catalog columns sees the query as typed.
///
/// # Example
/// ```
/// use catalog_search::embedding::normalize_query;
/// assert_eq!(normalize_query("  COVID-19 in France "), "covid-19 in france");
/// ```
pub fn normalize_query(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Inner product of two vectors of equal length.
///
/// Returns `None` if the lengths differ.
pub fn inner_product(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}
