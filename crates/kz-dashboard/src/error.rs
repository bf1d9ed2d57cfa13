//! Error types for the dashboard API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kz_sched::SchedError;
use serde::Serialize;

/// API error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Sampler error: {0}")]
    SamplerError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::SamplerError(_) => (StatusCode::BAD_GATEWAY, "sampler_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<SchedError> for ApiError {
    fn from(e: SchedError) -> Self {
        match e {
            SchedError::InvalidRingSize(_) | SchedError::InvalidParameter { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            SchedError::SamplerNotFound(_) => ApiError::NotFound(e.to_string()),
            SchedError::InvalidJobState { .. } | SchedError::NoSolver => {
                ApiError::Conflict(e.to_string())
            }
            SchedError::Sampler(_) => ApiError::SamplerError(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}
