//! crates/timekeeper_core/src/error.rs
//!
//! The error taxonomy every core operation reports to its caller.

use crate::ports::PortError;

/// Errors returned by the core services.
///
/// Every variant except `Internal` is caller-fixable and its message is safe to
/// show verbatim.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// A state precondition does not hold (already reviewed, already pending,
    /// timer already running, duplicate report).
    #[error("{0}")]
    Conflict(String),

    /// Authorization, ownership or assignment failure.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The caller could not be identified.
    #[error("{0}")]
    Unauthorized(String),

    /// An unexpected store failure. The detail is for logs only.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CoreError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }
}

impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => CoreError::NotFound(msg),
            PortError::Conflict(msg) => CoreError::Conflict(msg),
            PortError::Unexpected(msg) => CoreError::Internal(msg),
        }
    }
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
