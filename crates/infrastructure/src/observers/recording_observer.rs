//! Observer keeping retry events in memory

use application::ports::RetryObserverPort;
use domain::{RetryEvent, RetryEventType};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Counts of recorded events by type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// RETRY events
    pub retries: u64,
    /// SUCCESS events
    pub successes: u64,
    /// ERROR events
    pub errors: u64,
    /// IGNORED events
    pub ignored: u64,
}

/// Records every event it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RetryEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events, oldest first
    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events of one type
    pub fn count(&self, event_type: RetryEventType) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// Counts of recorded events by type
    pub fn summary(&self) -> EventSummary {
        let mut summary = EventSummary::default();
        for event in self.events.lock().iter() {
            match event.event_type() {
                RetryEventType::Retry => summary.retries += 1,
                RetryEventType::Success => summary.successes += 1,
                RetryEventType::Error => summary.errors += 1,
                RetryEventType::Ignored => summary.ignored += 1,
            }
        }
        summary
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl RetryObserverPort for RecordingObserver {
    fn on_event(&self, event: &RetryEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use domain::{AttemptOutcome, ErrorReason, Failure};

    use super::*;

    #[test]
    fn records_in_order_and_summarises() {
        let recorder = RecordingObserver::new();
        let failed = AttemptOutcome::failed(1, Duration::ZERO, Failure::http(502, "Bad Gateway"));

        recorder.on_event(&RetryEvent::retry("p", failed.clone(), Duration::from_secs(1)));
        recorder.on_event(&RetryEvent::retry("p", failed.clone(), Duration::from_secs(2)));
        recorder.on_event(&RetryEvent::error("p", failed, ErrorReason::Exhausted));

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type(), RetryEventType::Retry);
        assert_eq!(recorder.count(RetryEventType::Retry), 2);
        assert_eq!(
            recorder.summary(),
            EventSummary {
                retries: 2,
                errors: 1,
                ..EventSummary::default()
            }
        );
    }

    #[test]
    fn clear_empties_the_log() {
        let recorder = RecordingObserver::new();
        recorder.on_event(&RetryEvent::success(
            "p",
            AttemptOutcome::succeeded(1, Duration::ZERO),
        ));
        recorder.clear();
        assert!(recorder.events().is_empty());
    }
}
