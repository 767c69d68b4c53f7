//! Request and response types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::{CatalogRecord, ScoredRecord};

/// Message returned when ranking yields nothing.
pub const NO_RESULTS_MESSAGE: &str = "No results found.";

/// Body of `POST /search`. The query may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// A catalog record's source columns plus its scores. The embedding is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultDto {
    #[serde(flatten)]
    pub record: CatalogRecord,
    pub similarity: f32,
    pub penalty: f32,
    pub penalized_similarity: f32,
}

impl From<ScoredRecord> for SearchResultDto {
    fn from(scored: ScoredRecord) -> Self {
        let mut record = scored.record;
        record.embedding = Vec::new();
        Self {
            record,
            similarity: scored.similarity,
            penalty: scored.penalty,
            penalized_similarity: scored.penalized_similarity,
        }
    }
}

/// Successful search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Results { results: Vec<SearchResultDto> },
    Message { message: String },
}

impl SearchResponse {
    pub fn no_results() -> Self {
        SearchResponse::Message {
            message: NO_RESULTS_MESSAGE.to_string(),
        }
    }
}

/// Plain message body, used by `GET /hello`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
