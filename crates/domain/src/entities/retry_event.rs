//! Retry loop notifications
//!
//! A [`RetryEvent`] is emitted by the retry engine at each decision point of
//! one retry loop. Events are read-only for their consumers: observers can
//! log or count them but never influence the loop.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::failure::Failure;

/// Record of a single invocation inside a retry loop
///
/// Lives only for the duration of the loop that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// 1-based attempt index
    pub attempt: u32,
    /// Time spent in this invocation
    pub elapsed: Duration,
    /// Failure of the invocation, `None` when it succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl AttemptOutcome {
    /// Outcome of a successful invocation
    pub const fn succeeded(attempt: u32, elapsed: Duration) -> Self {
        Self {
            attempt,
            elapsed,
            failure: None,
        }
    }

    /// Outcome of a failed invocation
    pub const fn failed(attempt: u32, elapsed: Duration, failure: Failure) -> Self {
        Self {
            attempt,
            elapsed,
            failure: Some(failure),
        }
    }

    /// Whether the invocation succeeded
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Why a retry loop ended in an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// The attempt cap was reached while the failure was still retryable
    Exhausted,
    /// The failure was not eligible for retry
    NonRetryable,
    /// The loop was cancelled from outside
    Cancelled,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::NonRetryable => write!(f, "non-retryable"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payload of a retry event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryEventKind {
    /// A retryable failure occurred and another attempt follows after `wait`
    Retry {
        /// Backoff wait before the next attempt
        wait: Duration,
    },
    /// The operation succeeded
    Success,
    /// The loop ended with a failure
    Error {
        /// Terminal reason
        reason: ErrorReason,
    },
    /// The failure matched the policy's ignore list and was passed through
    Ignored,
}

/// Discriminant of [`RetryEventKind`], handy for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryEventType {
    /// See [`RetryEventKind::Retry`]
    Retry,
    /// See [`RetryEventKind::Success`]
    Success,
    /// See [`RetryEventKind::Error`]
    Error,
    /// See [`RetryEventKind::Ignored`]
    Ignored,
}

impl fmt::Display for RetryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "RETRY"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Error => write!(f, "ERROR"),
            Self::Ignored => write!(f, "IGNORED"),
        }
    }
}

/// Notification emitted by a retry loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEvent {
    /// Name of the policy that ran the loop
    pub policy: String,
    /// What happened
    pub kind: RetryEventKind,
    /// The invocation that triggered the event
    pub outcome: AttemptOutcome,
}

impl RetryEvent {
    /// Another attempt will follow
    pub fn retry(policy: impl Into<String>, outcome: AttemptOutcome, wait: Duration) -> Self {
        Self {
            policy: policy.into(),
            kind: RetryEventKind::Retry { wait },
            outcome,
        }
    }

    /// The operation succeeded
    pub fn success(policy: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            policy: policy.into(),
            kind: RetryEventKind::Success,
            outcome,
        }
    }

    /// The loop ended with a failure
    pub fn error(policy: impl Into<String>, outcome: AttemptOutcome, reason: ErrorReason) -> Self {
        Self {
            policy: policy.into(),
            kind: RetryEventKind::Error { reason },
            outcome,
        }
    }

    /// The failure was ignored by the policy
    pub fn ignored(policy: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            policy: policy.into(),
            kind: RetryEventKind::Ignored,
            outcome,
        }
    }

    /// Discriminant of this event
    pub const fn event_type(&self) -> RetryEventType {
        match self.kind {
            RetryEventKind::Retry { .. } => RetryEventType::Retry,
            RetryEventKind::Success => RetryEventType::Success,
            RetryEventKind::Error { .. } => RetryEventType::Error,
            RetryEventKind::Ignored => RetryEventType::Ignored,
        }
    }

    /// Number of attempts made so far
    pub const fn attempts(&self) -> u32 {
        self.outcome.attempt
    }

    /// Failure detail, if the event carries one
    pub const fn failure(&self) -> Option<&Failure> {
        self.outcome.failure.as_ref()
    }

    /// Terminal reason, for ERROR events
    pub const fn error_reason(&self) -> Option<ErrorReason> {
        match self.kind {
            RetryEventKind::Error { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} attempt={}",
            self.policy,
            self.event_type(),
            self.attempts()
        )?;
        if let Some(reason) = self.error_reason() {
            write!(f, " reason={reason}")?;
        }
        if let Some(failure) = self.failure() {
            write!(f, " failure=\"{failure}\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(attempt: u32) -> AttemptOutcome {
        AttemptOutcome::failed(attempt, Duration::from_millis(3), Failure::timeout("slow"))
    }

    #[test]
    fn event_types() {
        assert_eq!(
            RetryEvent::retry("p", failed(1), Duration::ZERO).event_type(),
            RetryEventType::Retry
        );
        assert_eq!(
            RetryEvent::success("p", AttemptOutcome::succeeded(1, Duration::ZERO)).event_type(),
            RetryEventType::Success
        );
        assert_eq!(
            RetryEvent::error("p", failed(3), ErrorReason::Exhausted).event_type(),
            RetryEventType::Error
        );
        assert_eq!(RetryEvent::ignored("p", failed(1)).event_type(), RetryEventType::Ignored);
    }

    #[test]
    fn error_event_exposes_reason_and_failure() {
        let event = RetryEvent::error("standard", failed(3), ErrorReason::Exhausted);
        assert_eq!(event.error_reason(), Some(ErrorReason::Exhausted));
        assert_eq!(event.attempts(), 3);
        assert_eq!(event.failure().map(|f| f.message.as_str()), Some("slow"));
    }

    #[test]
    fn success_event_has_no_failure() {
        let event = RetryEvent::success("fast", AttemptOutcome::succeeded(2, Duration::ZERO));
        assert!(event.failure().is_none());
        assert!(event.outcome.is_success());
        assert!(event.error_reason().is_none());
    }

    #[test]
    fn display_is_compact() {
        let event = RetryEvent::error("standard", failed(3), ErrorReason::NonRetryable);
        assert_eq!(
            event.to_string(),
            "[standard] ERROR attempt=3 reason=non-retryable failure=\"timeout: slow\""
        );
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let json = serde_json::to_string(&RetryEventKind::Error {
            reason: ErrorReason::Exhausted,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"ERROR","reason":"exhausted"}"#);
    }
}
