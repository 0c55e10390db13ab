//! Domain error types for Migrate Hub.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Every variant maps to a stable machine-readable code; transports translate the
//! code into their own status vocabulary.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller input rejected before anything was persisted
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced entity does not exist or is scoped to a different project
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation (duplicate project name, migration key, db-set name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// State machine refused the transition
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Content-addressed identity diverged between request and decision/execution
    #[error("migration checksum changed; request a new run")]
    ChecksumMismatch,

    /// DB set has zero active targets at request time
    #[error("no active targets in db set")]
    NoActiveTargets,

    /// Rollback requested without sql_down
    #[error("sql_down is required for rollback")]
    MissingSqlDown,

    /// Target was disabled after the run was requested
    #[error("target disabled")]
    TargetDisabled,

    /// Advisory lock could not be acquired within the deadline
    #[error("could not acquire migration lock on target")]
    LockBusy,

    /// Bookkeeping row exists with a different checksum
    #[error("migration already applied with different checksum")]
    ChecksumConflictOnTarget,

    /// Connection or SQL failure on a target database
    #[error("target error: {0}")]
    TargetError(String),

    /// Secret box seal/open failure; never carries key material
    #[error("crypto operation failed")]
    Crypto,

    /// Role or project gate refused the command
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Catalog database operation failed
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidStatus(_) => "invalid_status",
            AppError::ChecksumMismatch => "checksum_mismatch",
            AppError::NoActiveTargets => "no_active_targets",
            AppError::MissingSqlDown => "missing_sql_down",
            AppError::TargetDisabled => "target_disabled",
            AppError::LockBusy => "lock_busy",
            AppError::ChecksumConflictOnTarget => "checksum_conflict_on_target",
            AppError::TargetError(_) => "target_error",
            AppError::Crypto => "crypto_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) => "database_error",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status, message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Crypto => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Conflict(_) | AppError::ChecksumMismatch => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            _ => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
        })
    }
}

/// Error response body returned by the HTTP transport.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::Validation("x".into()).code(), "validation_error");
        assert_eq!(AppError::NotFound("run".into()).code(), "not_found");
        assert_eq!(AppError::Conflict("name".into()).code(), "conflict");
        assert_eq!(
            AppError::InvalidStatus("denied".into()).code(),
            "invalid_status"
        );
        assert_eq!(AppError::ChecksumMismatch.code(), "checksum_mismatch");
        assert_eq!(AppError::NoActiveTargets.code(), "no_active_targets");
        assert_eq!(AppError::MissingSqlDown.code(), "missing_sql_down");
        assert_eq!(AppError::TargetDisabled.code(), "target_disabled");
        assert_eq!(AppError::LockBusy.code(), "lock_busy");
        assert_eq!(
            AppError::ChecksumConflictOnTarget.code(),
            "checksum_conflict_on_target"
        );
        assert_eq!(AppError::TargetError("boom".into()).code(), "target_error");
        assert_eq!(AppError::Crypto.code(), "crypto_error");
        assert_eq!(AppError::Forbidden("role".into()).code(), "forbidden");
        assert_eq!(AppError::Unauthorized("who".into()).code(), "unauthorized");
    }

    #[test]
    fn test_crypto_error_does_not_leak_detail() {
        let err = AppError::Crypto;
        assert_eq!(err.to_string(), "crypto operation failed");
    }
}
