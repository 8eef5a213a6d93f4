//! Fault simulator port
//!
//! Stands in for a remote endpoint whose reliability is driven by a
//! [`FaultConfig`].

use async_trait::async_trait;
use domain::{FaultConfig, SimulatedFailure, SimulatedSuccess};
#[cfg(test)]
use mockall::automock;

/// Port for simulated unreliable endpoints
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FaultSimulatorPort: Send + Sync {
    /// Answer one invocation according to the fault configuration
    ///
    /// May suspend for the configured latency before a failure is returned.
    async fn simulate(&self, config: &FaultConfig) -> Result<SimulatedSuccess, SimulatedFailure>;
}
