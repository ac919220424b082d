//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{SimError, ValidationError};

/// Errors surfaced by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected simulation command.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// Malformed request parameter.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Sim(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Sim(SimError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Sim(SimError::DuplicateKey { .. }) => StatusCode::CONFLICT,
        };
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
