//! Application-level errors

use domain::{DomainError, Failure};
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Every attempt failed with a retryable failure
    #[error("Retries exhausted after {attempts} attempts: {failure}")]
    RetriesExhausted {
        /// Number of invocations made
        attempts: u32,
        /// Last failure seen
        #[source]
        failure: Failure,
    },

    /// The failure was not eligible for retry and was passed through
    #[error("Call failed without retry after {attempts} attempts: {failure}")]
    NotRetried {
        /// Number of invocations made
        attempts: u32,
        /// The failure as produced by the operation
        #[source]
        failure: Failure,
    },

    /// The call was cancelled before it completed
    #[error("Call cancelled after {attempts} attempts")]
    Cancelled {
        /// Number of invocations started
        attempts: u32,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Number of invocations behind this error, when known
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetriesExhausted { attempts, .. }
            | Self::NotRetried { attempts, .. }
            | Self::Cancelled { attempts } => Some(*attempts),
            _ => None,
        }
    }

    /// Failure that ended the call, when there is one
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::RetriesExhausted { failure, .. } | Self::NotRetried { failure, .. } => {
                Some(failure)
            },
            _ => None,
        }
    }
}
