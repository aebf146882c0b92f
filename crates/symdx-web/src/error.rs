//! API error type rendered as a JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<symdx_db::DbError> for ApiError {
    fn from(e: symdx_db::DbError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<symdx_ranker::RankerError> for ApiError {
    fn from(e: symdx_ranker::RankerError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<symdx_kg::KgError> for ApiError {
    fn from(e: symdx_kg::KgError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
