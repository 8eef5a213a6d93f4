//! Chaos engineering framework for resilience testing.
//!
//! Simulates an unreliable upstream endpoint so that retry policies can be
//! exercised without network I/O.
//!
//! # Overview
//!
//! - `FaultInjector`: decides per call whether to fail, with which error code
//!   and after how much latency
//! - `ChaosContext`: tracks injection statistics across calls
//!
//! # Example
//!
//! ```ignore
//! use domain::FaultConfig;
//! use infrastructure::chaos::FaultInjector;
//!
//! // Fail 30% of calls with a 503 after 200ms
//! let config = FaultConfig::always_failing("503")
//!     .with_error_rate(0.3)
//!     .with_response_delay_ms(200);
//!
//! let injector = FaultInjector::new();
//! let result = injector.wrap(&config, async { Ok(42) }).await;
//! ```

mod chaos_context;
mod fault_injector;

pub use chaos_context::{ChaosContext, ChaosStats, InjectionResult};
pub use fault_injector::FaultInjector;
