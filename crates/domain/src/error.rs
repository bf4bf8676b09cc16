//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body kind name is not recognised.
    #[error("unsupported body type: {0}")]
    UnsupportedBodyKind(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
