//! # Domain Errors
//!
//! Errors raised by aggregates and value objects when a business rule is
//! violated.
//!
//! # Examples
//!
//! ```
//! use procurement_engine::domain::errors::DomainError;
//!
//! let err = DomainError::validation("quantity must be positive");
//! assert!(err.to_string().contains("quantity"));
//! ```

use crate::domain::value_objects::arithmetic::ArithmeticError;
use thiserror::Error;

/// Error type for domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A lifecycle transition not allowed by the entity's transition table.
    #[error("invalid {entity} state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Kind of aggregate (`RFQ`, `Quotation`, `Payment`).
        entity: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Operation not legal in the current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Operation not supported for this kind of entity.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed or out-of-range input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The change collides with existing data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A child entity referenced by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity.
        entity: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl DomainError {
    /// Creates an invalid state transition error.
    #[must_use]
    pub fn transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidStateTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates an invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
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

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if the error is a lifecycle violation.
    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition { .. } | Self::InvalidState(_)
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_both_states() {
        let err = DomainError::transition("RFQ", "CLOSED", "PUBLISHED");
        let msg = err.to_string();
        assert!(msg.contains("RFQ"));
        assert!(msg.contains("CLOSED"));
        assert!(msg.contains("PUBLISHED"));
        assert!(err.is_state_error());
    }

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = DomainError::not_found("RFQ item", "abc");
        assert_eq!(err.to_string(), "RFQ item not found: abc");
        assert!(!err.is_state_error());
    }

    #[test]
    fn arithmetic_converts() {
        let err: DomainError = ArithmeticError::Overflow.into();
        assert!(matches!(err, DomainError::Arithmetic(ArithmeticError::Overflow)));
    }
}
