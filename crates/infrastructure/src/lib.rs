//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer.
//! Contains the fault injector, the backoff library, the retry engine with
//! its observers, configuration loading and logging setup.

pub mod adapters;
pub mod backoff;
pub mod chaos;
pub mod config;
pub mod observers;
pub mod retry;
pub mod telemetry;

pub use adapters::FaultInjectionClient;
pub use backoff::Backoff;
pub use chaos::{ChaosStats, FaultInjector};
pub use config::{AppConfig, ScenarioConfig};
pub use observers::{EventSummary, RecordingObserver, TracingRetryObserver};
pub use retry::{
    PolicyCatalog, PolicySpec, RetryConfig, RetryError, RetryPolicy, RetryResult, with_retry,
};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
