//! Error types for opinionated.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    /// A referenced post, choice, user, tag, or comment does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required identifier is missing or a supplied argument is inconsistent
    /// (mismatched choice/post pairing, self-follow, blank content).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires an authenticated actor the boundary did not
    /// supply, or the actor is not allowed to perform it.
    #[error("Unauthorized")]
    Unauthorized,

    /// A store-level uniqueness constraint rejected the write.
    ///
    /// Operations with idempotent contracts (vote upsert, follow, tag linking)
    /// catch this internally and recover; it only propagates where a duplicate
    /// is a genuine caller error (e.g. registering an email twice).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code for boundary responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error is an infrastructure fault rather than a
    /// caller mistake.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Convert a database error, classifying uniqueness violations.
    ///
    /// Unique-index rejections become [`AppError::ConstraintViolation`] so
    /// callers can distinguish a lost insert race from a broken connection.
    #[must_use]
    pub fn from_db(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                Self::ConstraintViolation(msg)
            }
            _ => Self::Database(err.to_string()),
        }
    }

    /// Returns true if this is a uniqueness-violation error.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::NotFound("post".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            AppError::InvalidArgument("x".to_string()).error_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(AppError::Unauthorized.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_server_error_classification() {
        assert!(AppError::Database("down".to_string()).is_server_error());
        assert!(!AppError::Unauthorized.is_server_error());
        assert!(!AppError::NotFound("x".to_string()).is_server_error());
    }

    #[test]
    fn test_unique_violation_flag() {
        assert!(AppError::ConstraintViolation("dup".to_string()).is_unique_violation());
        assert!(!AppError::Database("dup".to_string()).is_unique_violation());
    }
}
