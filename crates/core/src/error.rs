//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, lookups). Storage and transport failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. negative adjustment quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. changing the unit of a pool with movements).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. empty or parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// True for caller mistakes (bad arguments), as opposed to broken invariants or missing state.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidId(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = DomainError::validation("quantity must be non-negative");
        assert_eq!(
            err.to_string(),
            "validation failed: quantity must be non-negative"
        );

        let err = DomainError::not_found("pool flour");
        assert_eq!(err.to_string(), "not found: pool flour");
    }

    #[test]
    fn validation_classification() {
        assert!(DomainError::validation("x").is_validation());
        assert!(DomainError::invalid_id("x").is_validation());
        assert!(!DomainError::invariant("x").is_validation());
    }
}
