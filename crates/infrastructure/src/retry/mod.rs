//! Retry policies with pluggable backoff
//!
//! - [`RetryConfig`]: immutable description of a policy, plus the stock presets
//! - [`RetryPolicy`]: runs an operation under a configuration and reports
//!   every decision to its observers
//! - [`PolicyCatalog`]: explicit map of named policies, filled from
//!   [`PolicySpec`] entries in configuration

mod catalog;
mod config;
mod engine;
mod error;

pub use catalog::{PolicyCatalog, PolicySpec};
pub use config::{FailurePredicate, RetryConfig, RetryConfigBuilder, kinds_predicate};
pub use engine::{RetryPolicy, RetryResult, with_retry};
pub use error::RetryError;
