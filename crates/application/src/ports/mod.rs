//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod fault_simulator_port;
mod resilient_call_port;
mod retry_observer_port;

#[cfg(test)]
pub use fault_simulator_port::MockFaultSimulatorPort;
pub use fault_simulator_port::FaultSimulatorPort;
#[cfg(test)]
pub use resilient_call_port::MockResilientCallPort;
pub use resilient_call_port::{CallResponse, ResilientCallPort};
#[cfg(test)]
pub use retry_observer_port::MockRetryObserverPort;
pub use retry_observer_port::RetryObserverPort;
