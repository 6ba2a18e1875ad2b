//! Shared API types for the Raahi server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use raahi_pipeline::TurnError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Every error body has the shape `{"success": false, "error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}
