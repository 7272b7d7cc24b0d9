//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use partsdesk_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Every handler failure. Renders as `{"success": false, "error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many login attempts, try again later")]
    RateLimited,

    /// The detail is logged, never sent.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Insufficient permissions".to_string())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(_)
            | CoreError::Parse(_)
            | CoreError::Row { .. }
            | CoreError::DuplicateKey { .. }
            | CoreError::ForeignKey { .. }
            | CoreError::InvalidTransition { .. } => Self::BadRequest(err.to_string()),
            CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            CoreError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            CoreError::InvalidToken | CoreError::SessionExpired => Self::unauthorized(),
            CoreError::Forbidden(message) => Self::Forbidden(message),
            CoreError::Storage(_) | CoreError::Codec(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
