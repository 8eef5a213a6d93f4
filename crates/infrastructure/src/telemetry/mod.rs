//! Logging infrastructure
//!
//! Installs the global `tracing` subscriber used by the binaries.

mod subscriber;

pub use subscriber::{TelemetryConfig, TelemetryError, init_telemetry};
