//! Endpoint handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, error};

use super::types::{ErrorResponse, MessageResponse, SearchRequest, SearchResponse, SearchResultDto};
use super::AppState;
use crate::service::{SearchOutcome, ServiceError};

/// Error response carrying a status code and a `detail` message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Ranking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.status, self.detail);
        } else {
            debug!("Request rejected ({}): {}", self.status, self.detail);
        }
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

/// POST /search - Rank the catalog against a free-text query
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let response = match state.service.search(request.query.as_deref()).await? {
        SearchOutcome::Results(results) => SearchResponse::Results {
            results: results.into_iter().map(SearchResultDto::from).collect(),
        },
        SearchOutcome::NoResults => SearchResponse::no_results(),
    };
    Ok(Json(response))
}

/// GET /hello - Liveness probe
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from catalog search!".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use crate::query::QueryError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::Validation("Query cannot be empty.".into()), StatusCode::BAD_REQUEST),
            (ServiceError::ModelUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::Timeout(Duration::from_secs(30)), StatusCode::GATEWAY_TIMEOUT),
            (
                ServiceError::Ranking(QueryError::Embedding(EmbeddingError::Generation("nan".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_validation_detail_is_bare_message() {
        let err = ApiError::from(ServiceError::Validation("Query cannot be empty.".into()));
        assert_eq!(err.detail, "Query cannot be empty.");
    }
}
