//! Error types for studyhall.

use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Phone number already registered: {0}")]
    DuplicatePhone(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Unauthorized")]
    Unauthorized,

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or a uniqueness conflict.
    Validation,
    /// The member's lifecycle state does not satisfy the precondition.
    State,
    /// The target seat is not available at the moment of the operation.
    ResourceUnavailable,
    /// Unknown member, seat or request id.
    NotFound,
    /// Credential mismatch.
    Unauthorized,
    /// Store or configuration failure.
    Infrastructure,
}

impl AppError {
    /// Returns the class this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) | Self::DuplicatePhone(_) => ErrorKind::Validation,
            Self::State(_) => ErrorKind::State,
            Self::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the error code for collaborator-facing responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DuplicatePhone(_) => "DUPLICATE_PHONE",
            Self::State(_) => "STATE_ERROR",
            Self::ResourceUnavailable(_) => "RESOURCE_UNAVAILABLE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Infrastructure)
    }

    /// Render the error as a JSON body for the UI/API collaborator.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        })
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
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
