//! Outcomes produced by the fault injector

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::failure::Failure;
use crate::value_objects::ErrorCode;

/// Answer of a simulated endpoint that decided not to fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedSuccess {
    /// Status line of the answer
    pub message: String,
    /// Payload of the answer
    pub data: String,
    /// When the answer was produced
    pub timestamp: DateTime<Utc>,
}

impl SimulatedSuccess {
    /// Standard "no error" answer
    pub fn available() -> Self {
        Self {
            message: "service available - no error".to_string(),
            data: "Resource successfully retrieved".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Failure deliberately produced by the fault injector
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("simulated {error_code} (retry after {retry_after_seconds}s)")]
pub struct SimulatedFailure {
    /// Failure class
    pub error_code: ErrorCode,
    /// Advisory retry-after value, seconds
    pub retry_after_seconds: u32,
    /// Latency injected before the failure was returned, milliseconds
    pub injected_delay_ms: u64,
    /// When the failure was produced
    pub timestamp: DateTime<Utc>,
}

impl SimulatedFailure {
    /// Create a failure descriptor for the given class
    pub fn new(error_code: ErrorCode, retry_after_seconds: u32, injected_delay: Duration) -> Self {
        Self {
            error_code,
            retry_after_seconds,
            injected_delay_ms: u64::try_from(injected_delay.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
        }
    }

    /// HTTP status of the failure
    pub const fn status(&self) -> u16 {
        self.error_code.status()
    }

    /// Reason phrase of the failure
    pub const fn message(&self) -> &'static str {
        self.error_code.reason_phrase()
    }

    /// Value of the `Retry-After` hint
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(u64::from(self.retry_after_seconds))
    }
}

impl From<SimulatedFailure> for Failure {
    fn from(failure: SimulatedFailure) -> Self {
        Self::new(failure.error_code.failure_kind(), failure.message())
            .with_status(failure.status())
            .with_retry_after(failure.retry_after())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FailureKind;

    #[test]
    fn failure_exposes_status_and_phrase() {
        let failure = SimulatedFailure::new(ErrorCode::BadGateway, 5, Duration::from_millis(250));
        assert_eq!(failure.status(), 502);
        assert_eq!(failure.message(), "Bad Gateway");
        assert_eq!(failure.injected_delay_ms, 250);
        assert_eq!(failure.retry_after(), Duration::from_secs(5));
    }

    #[test]
    fn converts_into_caller_failure() {
        let failure: Failure =
            SimulatedFailure::new(ErrorCode::GatewayTimeout, 3, Duration::ZERO).into();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.status, Some(504));
        assert_eq!(failure.retry_after, Some(Duration::from_secs(3)));
        assert_eq!(failure.message, "Gateway Timeout");
    }

    #[test]
    fn display_mentions_code_and_retry_after() {
        let failure = SimulatedFailure::new(ErrorCode::TooManyRequests, 30, Duration::ZERO);
        assert_eq!(
            failure.to_string(),
            "simulated 429 Too Many Requests (retry after 30s)"
        );
    }

    #[test]
    fn success_answer() {
        let success = SimulatedSuccess::available();
        assert_eq!(success.message, "service available - no error");
    }
}
