//! Domain error types for check resolution.

use thiserror::Error;

/// Domain-specific errors for check resolution.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Error during permission check resolution.
    #[error("resolver error: {message}")]
    ResolverError { message: String },

    /// A resolver in the chain was invoked before its delegate was wired.
    #[error("resolver '{resolver}' has no delegate configured")]
    DelegateNotConfigured { resolver: &'static str },

    /// Dispatch throttling configuration rejected at construction.
    #[error("invalid dispatch throttling config: {message}")]
    InvalidThrottlingConfig { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
