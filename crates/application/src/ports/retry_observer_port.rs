//! Retry event observer port
//!
//! Sink for the notifications a retry loop emits. Implementations log,
//! count or export events; they must not try to steer the loop.

use domain::RetryEvent;
#[cfg(test)]
use mockall::automock;

/// Port for consumers of retry events
///
/// Called synchronously from inside the retry loop, so implementations
/// should return quickly and never block on I/O.
#[cfg_attr(test, automock)]
pub trait RetryObserverPort: Send + Sync {
    /// Receive one event
    fn on_event(&self, event: &RetryEvent);
}
