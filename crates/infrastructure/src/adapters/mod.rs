//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod fault_injection_client;

pub use fault_injection_client::FaultInjectionClient;
