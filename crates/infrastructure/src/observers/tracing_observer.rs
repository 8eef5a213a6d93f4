//! Observer writing retry events to the tracing pipeline

use application::ports::RetryObserverPort;
use domain::{ErrorReason, RetryEvent, RetryEventKind};
use tracing::{debug, error, info, warn};

/// Logs every retry event at a level matching its severity
///
/// Retries are warnings, successes info, terminal errors errors and ignored
/// failures debug. A cancelled loop is logged as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRetryObserver;

impl TracingRetryObserver {
    /// Create a new tracing observer
    pub const fn new() -> Self {
        Self
    }
}

impl RetryObserverPort for TracingRetryObserver {
    fn on_event(&self, event: &RetryEvent) {
        let policy = event.policy.as_str();
        let attempt = event.attempts();
        let failure = event
            .failure()
            .map(ToString::to_string)
            .unwrap_or_default();

        match &event.kind {
            RetryEventKind::Retry { wait } => warn!(
                policy,
                attempt,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                failure = %failure,
                "Retrying call"
            ),
            RetryEventKind::Success => info!(policy, attempt, "Call succeeded"),
            RetryEventKind::Error {
                reason: ErrorReason::Cancelled,
            } => warn!(policy, attempt, "Retry loop cancelled"),
            RetryEventKind::Error { reason } => error!(
                policy,
                attempt,
                reason = %reason,
                failure = %failure,
                "Call failed"
            ),
            RetryEventKind::Ignored => debug!(
                policy,
                attempt,
                failure = %failure,
                "Failure ignored by policy"
            ),
        }
    }
}
