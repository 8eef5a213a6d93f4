//! Application layer - Use cases and orchestration
//!
//! Defines the ports through which the harness talks to simulated endpoints
//! and event sinks, and the scenario service that drives them.

pub mod error;
pub mod ports;
pub mod request_context;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use request_context::RequestContext;
pub use services::*;
