use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::controller::{FieldErrors, ForecastError};

pub const SERVER_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// API error types that can be returned from handlers.
///
/// Bodies are objects keyed by field name; unexpected failures use the
/// `server` key and never carry internal detail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request on {field}: {message}")]
    BadRequest { field: String, message: String },

    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest { .. } => "BadRequest",
            ApiError::Validation(_) => "ValidationError",
            ApiError::Internal(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let body = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error_type, %detail, "request failed");
                json!({ "server": SERVER_ERROR_MESSAGE })
            }
            ApiError::Validation(fields) => {
                tracing::debug!(error_type, ?fields, "client error");
                json!(fields)
            }
            ApiError::BadRequest { field, message } => {
                tracing::debug!(error_type, %field, %message, "client error");
                json!(FieldErrors::from([(field, message)]))
            }
            ApiError::NotFound(what) => {
                tracing::debug!(error_type, %what, "client error");
                json!({ "error": format!("{what} not found") })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(error: ForecastError) -> Self {
        match error {
            ForecastError::Validation(fields) => ApiError::Validation(fields),
            ForecastError::Internal(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        ApiError::Internal(error.to_string())
    }
}
