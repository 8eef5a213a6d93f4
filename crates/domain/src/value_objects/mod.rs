//! Value Objects - Immutable, identity-less domain primitives

mod error_code;
mod fault_config;

pub use error_code::ErrorCode;
pub use fault_config::FaultConfig;
