//! Domain layer for the resilience harness
//!
//! Contains the fault configuration, failure descriptors and retry events
//! shared by the fault injector and the retry engine. This layer performs no
//! I/O and defines the ubiquitous language.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
