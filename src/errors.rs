//! Unified error type for Routine Grid.
//!
//! Every core operation returns [`Result`]. Variants map onto four caller-facing
//! outcomes (see [`ErrorKind`]) plus an internal bucket for storage, I/O and
//! configuration failures.

use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// No authenticated caller identity was supplied.
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// The object does not exist or is not owned by the caller.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of object that was looked up (e.g. `"habit"`)
        resource: &'static str,
        /// Identifier the caller asked for
        id: i64,
    },

    /// A single input field failed validation.
    #[error("Invalid value for `{field}`: {message}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// Cross-field or uniqueness validation failed.
    #[error("Validation failed: {message}")]
    Invalid {
        /// Human-readable reason
        message: String,
    },

    /// A query parameter could not be interpreted.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable reason
        message: String,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request carried no valid identity
    Unauthenticated,
    /// Object absent or hidden from the caller
    NotFound,
    /// Field-level, cross-field or uniqueness failure
    ValidationFailed,
    /// Malformed query parameter
    BadRequest,
    /// Anything the caller cannot fix
    Internal,
}

impl Error {
    /// Classifies the error for the outer request layer.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidField { .. } | Self::Invalid { .. } => ErrorKind::ValidationFailed,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Name of the offending field for field-level validation errors.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }

    pub(crate) fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
