//! Error types for the panel.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{field} is required")]
    FieldRequired { field: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The entity is not in the state the operation requires.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    /// Expected request context (e.g. the user behind a session) is missing.
    #[error("unknown error")]
    Unknown,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    pub fn field_required(field: impl Into<String>) -> Self {
        Self::FieldRequired {
            field: field.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether the error was caused by the caller's input and may be shown
    /// to them verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::AuthenticationFailed { .. }
                | Self::InvalidCredentials
                | Self::FieldRequired { .. }
                | Self::Validation { .. }
                | Self::Conflict { .. }
        )
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::InvalidCredentials => "invalid_credentials",
            Self::FieldRequired { .. } => "field_required",
            Self::Validation { .. } => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => "internal",
            Self::Unknown => "unknown",
        }
    }
}

/// Client-facing error body.
///
/// Internal failures are reported with a generic message so persistence,
/// resolver and signing details never leave the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl From<&PanelError> for ErrorResponse {
    fn from(err: &PanelError) -> Self {
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            "internal server error".to_string()
        };
        Self {
            code: err.code(),
            message,
        }
    }
}
