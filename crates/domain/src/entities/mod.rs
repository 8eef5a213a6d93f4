//! Domain entities - Records produced while simulating and retrying calls

mod failure;
mod retry_event;
mod simulated_outcome;

pub use failure::{Failure, FailureKind};
pub use retry_event::{AttemptOutcome, ErrorReason, RetryEvent, RetryEventKind, RetryEventType};
pub use simulated_outcome::{SimulatedFailure, SimulatedSuccess};
