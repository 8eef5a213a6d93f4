//! Request context for one logical call in a test scenario
//!
//! The context travels with a call through the retry engine and is handed to
//! the fallback producer when every attempt failed, so a degraded answer can
//! say which request it stands in for. It also carries the cancellation
//! token that stops the call's retry loop.
//!
//! # Examples
//!
//! ```
//! use application::RequestContext;
//!
//! let ctx = RequestContext::new("checkout-burst", 7);
//! assert_eq!(ctx.scenario(), "checkout-burst");
//! assert_eq!(ctx.sequence(), 7);
//! assert!(!ctx.request_id().is_nil());
//! ```

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Context for a single logical request
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    scenario: String,
    sequence: u32,
    timestamp: DateTime<Utc>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a context for request number `sequence` of a scenario
    ///
    /// Generates a new random request ID and captures the current timestamp.
    #[must_use]
    pub fn new(scenario: impl Into<String>, sequence: u32) -> Self {
        Self::with_request_id(scenario, sequence, Uuid::new_v4())
    }

    /// Create a context with a specific request ID
    ///
    /// Useful when the ID has to be correlated with an upstream caller.
    #[must_use]
    pub fn with_request_id(scenario: impl Into<String>, sequence: u32, request_id: Uuid) -> Self {
        Self {
            request_id,
            scenario: scenario.into(),
            sequence,
            timestamp: Utc::now(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Stop this request when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Get the unique request identifier
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the scenario this request belongs to
    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Get the position of this request within its scenario
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Get the timestamp when the request was created
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Token whose cancellation aborts the request
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the request has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
