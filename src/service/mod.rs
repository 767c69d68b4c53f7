//! Query service.
//!
//! The boundary between transports (HTTP, CLI) and the ranking pipeline:
//! validation, normalization, factor extraction and a timeout around ranking.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::embedding::{normalize_query, EmbeddingError};
use crate::extraction::FactorExtractor;
use crate::models::ScoredRecord;
use crate::query::{QueryError, Ranker};

/// Message returned for empty or absent queries.
pub const EMPTY_QUERY_MESSAGE: &str = "Query cannot be empty.";

/// Default bound on a single ranking attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced to callers of [`QueryService::search`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was rejected before ranking
    #[error("{0}")]
    Validation(String),

    /// The embedding backend could not be loaded or reached
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Ranking did not finish within the request timeout
    #[error("Search timed out after {0:?}")]
    Timeout(Duration),

    /// Any other ranking failure
    #[error("Search failed: {0}")]
    Ranking(QueryError),
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Embedding(EmbeddingError::ModelUnavailable(msg)) => {
                ServiceError::ModelUnavailable(msg)
            }
            other => ServiceError::Ranking(other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Terminal states of a successful search.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Ranked records, best first
    Results(Vec<ScoredRecord>),
    /// Ranking produced nothing (only possible with an empty catalog)
    NoResults,
}

impl SearchOutcome {
    pub fn results(&self) -> &[ScoredRecord] {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::NoResults => &[],
        }
    }
}

/// Runs validation, preprocessing, extraction and ranking for one query.
///
/// Constructed once at startup and shared between requests; nothing in the
/// search path mutates it.
pub struct QueryService {
    catalog: Catalog,
    extractor: FactorExtractor,
    ranker: Arc<dyn Ranker>,
    request_timeout: Duration,
}

impl QueryService {
    pub fn new(catalog: Catalog, extractor: FactorExtractor, ranker: impl Ranker + 'static) -> Self {
        Self {
            catalog,
            extractor,
            ranker: Arc::new(ranker),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Search the catalog for a raw, user-supplied query.
    ///
    /// # Errors
    /// - `Validation` if the query is absent or blank; ranking is not invoked
    /// - `ModelUnavailable` if the embedding backend fails to load
    /// - `Timeout` if ranking exceeds the request timeout
    pub async fn search(&self, raw_query: Option<&str>) -> ServiceResult<SearchOutcome> {
        let Some(raw_query) = raw_query.filter(|q| !q.trim().is_empty()) else {
            return Err(ServiceError::Validation(EMPTY_QUERY_MESSAGE.to_string()));
        };

        let query = normalize_query(raw_query);
        let factors = self.extractor.extract(&query);
        debug!("Searching for '{}'", query);

        let ranked = tokio::time::timeout(
            self.request_timeout,
            self.ranker.rank(&query, &factors, &self.catalog),
        )
        .await
        .map_err(|_| {
            warn!("Search for '{}' timed out after {:?}", query, self.request_timeout);
            ServiceError::Timeout(self.request_timeout)
        })??;

        if ranked.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Results(ranked))
        }
    }
}

impl fmt::Debug for QueryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryService")
            .field("catalog_len", &self.catalog.len())
            .field("extractor", &self.extractor)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
