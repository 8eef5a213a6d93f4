//! Retry event observers
//!
//! Sinks implementing [`application::ports::RetryObserverPort`]. They never
//! influence the retry loop that feeds them.

mod recording_observer;
mod tracing_observer;

pub use recording_observer::{EventSummary, RecordingObserver};
pub use tracing_observer::TracingRetryObserver;
