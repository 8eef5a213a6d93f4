//! Terminal outcomes of a retry loop

use application::ApplicationError;
use domain::Failure;
use thiserror::Error;

/// Why a retry loop gave up
///
/// Every variant carries the number of invocations that were started, so
/// callers can tell a first-try rejection from an exhausted budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// Every attempt failed with a retryable failure
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Invocations made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last: Failure,
    },

    /// The failure was not eligible for retry
    #[error("non-retryable failure on attempt {attempts}: {failure}")]
    NonRetryable {
        /// Invocations made
        attempts: u32,
        /// The failure, unchanged
        #[source]
        failure: Failure,
    },

    /// The failure matched the policy's ignore list
    #[error("ignored failure on attempt {attempts}: {failure}")]
    Ignored {
        /// Invocations made
        attempts: u32,
        /// The failure, unchanged
        #[source]
        failure: Failure,
    },

    /// The loop was cancelled before it reached a terminal outcome
    #[error("cancelled after {attempts} attempts")]
    Cancelled {
        /// Invocations started
        attempts: u32,
    },
}

impl RetryError {
    /// Number of invocations started
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::Ignored { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Failure that ended the loop
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Exhausted { last: failure, .. }
            | Self::NonRetryable { failure, .. }
            | Self::Ignored { failure, .. } => Some(failure),
            Self::Cancelled { .. } => None,
        }
    }

    /// Whether the attempt budget was used up
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// The failure as the caller would have seen it without the policy
    pub fn into_failure(self) -> Failure {
        match self {
            Self::Exhausted { last: failure, .. }
            | Self::NonRetryable { failure, .. }
            | Self::Ignored { failure, .. } => failure,
            Self::Cancelled { .. } => Failure::cancelled(),
        }
    }
}

impl From<RetryError> for ApplicationError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => Self::RetriesExhausted {
                attempts,
                failure: last,
            },
            RetryError::NonRetryable { attempts, failure }
            | RetryError::Ignored { attempts, failure } => Self::NotRetried { attempts, failure },
            RetryError::Cancelled { attempts } => Self::Cancelled { attempts },
        }
    }
}
