//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how core
//! errors are rendered as HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use timekeeper_core::{CoreError, PortError};
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core services.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// A failed schema migration at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        ApiError::Core(err.into())
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Core(CoreError::Unauthorized(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Core(CoreError::validation(message))
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(err) => match err {
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
                CoreError::Internal(_) => internal(),
            },
            _ => internal(),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type returned by every handler.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CoreError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(status_of(CoreError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::conflict("x")), StatusCode::CONFLICT);
        assert_eq!(status_of(CoreError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(CoreError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(CoreError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_stays_private() {
        let (_, message) =
            ApiError::from(CoreError::Internal("relation users does not exist".into()))
                .status_and_message();
        assert_eq!(message, "Internal server error");

        let (_, message) = ApiError::from(CoreError::conflict("Timer already running"))
            .status_and_message();
        assert_eq!(message, "Timer already running");
    }
}
