//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Error code not part of the simulated failure classes
    #[error("Unknown error code: {0}")]
    UnknownErrorCode(String),

    /// Failure classification tag not recognised
    #[error("Unknown failure kind: {0}")]
    UnknownFailureKind(String),

    /// Named retry policy not present in the catalog
    #[error("Retry policy not found: {0}")]
    PolicyNotFound(String),

    /// Configuration could not be turned into a usable value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DomainError {
    /// Create a policy not found error
    pub fn policy_not_found(name: impl Into<String>) -> Self {
        Self::PolicyNotFound(name.into())
    }
}
