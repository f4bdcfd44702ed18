//! Unified Error Model
//!
//! Every public operation of the engine fails with a [`VigilError`]. Each
//! variant carries a stable machine code and the HTTP status the API layer
//! reports for it.
use crate::data_model::Status;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VigilError {
    /// Malformed or out-of-range input, including factor scores outside `[0, max]`
    #[error("VALIDATION/{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// No identity supplied for an operation that needs one
    #[error("AUTH/{0}")]
    Authentication(String),

    /// Identity present but lacking the required role
    #[error("FORBIDDEN/{0}")]
    Authorization(String),

    /// Illegal state transition or lost concurrent race
    #[error("CONFLICT/{message}")]
    Conflict {
        message: String,
        current_status: Option<Status>,
    },

    #[error("NOT_FOUND/{0}")]
    NotFound(String),

    #[error("RATE/{0}")]
    RateLimited(String),

    /// Backing store failure that could not be degraded locally
    #[error("STORAGE/{0}")]
    Storage(String),
}

impl VigilError {
    /// Validation error without a specific field
    pub fn validation(message: impl Into<String>) -> Self {
        VigilError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Validation error pinned to a request field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        VigilError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Conflict carrying the report's actual status so callers can resync
    pub fn conflict(message: impl Into<String>, current_status: Status) -> Self {
        VigilError::Conflict {
            message: message.into(),
            current_status: Some(current_status),
        }
    }

    /// Stable code used in the `{error, code}` envelope
    pub fn code(&self) -> &'static str {
        match self {
            VigilError::Validation { .. } => "VALIDATION_ERROR",
            VigilError::Authentication(_) => "AUTHENTICATION_ERROR",
            VigilError::Authorization(_) => "AUTHORIZATION_ERROR",
            VigilError::Conflict { .. } => "CONFLICT",
            VigilError::NotFound(_) => "NOT_FOUND",
            VigilError::RateLimited(_) => "RATE_LIMITED",
            VigilError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the API reports for this error
    pub fn http_status(&self) -> u16 {
        match self {
            VigilError::Validation { .. } => 400,
            VigilError::Authentication(_) => 401,
            VigilError::Authorization(_) => 403,
            VigilError::NotFound(_) => 404,
            VigilError::Conflict { .. } => 409,
            VigilError::RateLimited(_) => 429,
            VigilError::Storage(_) => 500,
        }
    }

    /// Field that failed validation, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            VigilError::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Actual status reported with a conflict, if any
    pub fn current_status(&self) -> Option<Status> {
        match self {
            VigilError::Conflict { current_status, .. } => *current_status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VigilError>;
