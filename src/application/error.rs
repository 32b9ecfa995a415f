//! # Application Errors
//!
//! Error types for the application layer.
//!
//! Every rejected request surfaces one [`ErrorKind`]. Domain and
//! repository errors are folded into that taxonomy by the `From` impls
//! below; storage failures that say nothing about the request itself stay
//! wrapped in [`InfrastructureError`].
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── NotFound { resource_type, id }  - Missing aggregate or reference
//! ├── InvalidState(String)            - Lifecycle forbids the operation
//! ├── InvalidOperation(String)        - Operation unsupported for this entity
//! ├── Validation(String)              - Malformed or out-of-range input
//! ├── Conflict(String)                - Collides with existing data or a concurrent write
//! ├── Forbidden(String)               - Caller may not act on this entity
//! └── Infrastructure(InfrastructureError) - Storage or event sink failure
//! ```
//!
//! # Examples
//!
//! ```
//! use procurement_engine::application::error::{ApplicationError, ErrorKind};
//! use procurement_engine::infrastructure::persistence::RepositoryError;
//!
//! let err = ApplicationError::not_found("RFQ", "rfq-123");
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//!
//! let err: ApplicationError = RepositoryError::version_conflict("RFQ", "rfq-123", 1, 2).into();
//! assert_eq!(err.kind(), ErrorKind::Conflict);
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::{EventStoreError, RepositoryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Infrastructure layer error.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Repository or gateway failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Event store failure.
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),
}

impl InfrastructureError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(e) => e.is_transient(),
            Self::EventStore(_) => false,
        }
    }
}

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing aggregate or reference record.
    NotFound,
    /// Lifecycle forbids the operation.
    InvalidState,
    /// Operation unsupported for this entity.
    InvalidOperation,
    /// Malformed or out-of-range input.
    Validation,
    /// Collides with existing data or lost a concurrent write.
    Conflict,
    /// Caller may not act on this entity.
    Forbidden,
    /// Storage failure.
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Forbidden => "FORBIDDEN",
            Self::Infrastructure => "INFRASTRUCTURE",
        };
        f.write_str(s)
    }
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Operation not supported.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflicting data or concurrent modification.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller lacks access.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure error from external systems.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),
}

impl ApplicationError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Returns the caller-facing category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Infrastructure(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { .. } | DomainError::InvalidState(_) => {
                Self::InvalidState(err.to_string())
            }
            DomainError::InvalidOperation(msg) => Self::InvalidOperation(msg),
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::NotFound { entity, id } => Self::NotFound {
                resource_type: entity.to_string(),
                id,
            },
            DomainError::Arithmetic(e) => Self::Validation(format!("amount out of range: {e}")),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity_type, id } => Self::NotFound {
                resource_type: entity_type.to_string(),
                id,
            },
            RepositoryError::Duplicate { .. }
            | RepositoryError::VersionConflict { .. }
            | RepositoryError::Referenced { .. } => Self::Conflict(err.to_string()),
            other => Self::Infrastructure(InfrastructureError::Repository(other)),
        }
    }
}

impl From<EventStoreError> for ApplicationError {
    fn from(err: EventStoreError) -> Self {
        Self::Infrastructure(InfrastructureError::EventStore(err))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
