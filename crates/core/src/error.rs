//! Errors produced by the domain layer.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic domain failure: a value or entity state that the rules
/// reject. Storage and transport failures live in their own layers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field value is malformed or out of range.
    #[error("invalid value: {0}")]
    Validation(String),

    /// The entity as a whole breaks a structural rule (tier/supplier/debt).
    #[error("rule violated: {0}")]
    InvariantViolation(String),

    /// An identifier string did not parse.
    #[error("bad identifier: {0}")]
    InvalidId(String),

    /// The referenced entity does not exist.
    #[error("no such entity")]
    NotFound,

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),
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
}
