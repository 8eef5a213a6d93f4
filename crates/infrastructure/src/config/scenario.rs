//! Scenario runner settings

use application::ScenarioRequest;
use domain::FaultConfig;
use serde::{Deserialize, Serialize};

/// Defaults for `run` when the command line does not override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario label
    #[serde(default = "default_name")]
    pub name: String,

    /// Logical requests per run (default: 10)
    #[serde(default = "default_requests")]
    pub requests: u32,

    /// Requests in flight at once (default: 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retry policy protecting the calls (default: standard)
    #[serde(default = "default_policy")]
    pub policy: String,

    /// Degraded answer once retries are exhausted; errors are reported when unset
    #[serde(default)]
    pub fallback_message: Option<String>,
}

fn default_name() -> String {
    "default".to_string()
}

const fn default_requests() -> u32 {
    10
}

const fn default_concurrency() -> usize {
    1
}

fn default_policy() -> String {
    "standard".to_string()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            requests: default_requests(),
            concurrency: default_concurrency(),
            policy: default_policy(),
            fallback_message: None,
        }
    }
}

impl ScenarioConfig {
    /// Scenario request against the given fault
    pub fn to_request(&self, fault: FaultConfig) -> ScenarioRequest {
        ScenarioRequest::new(self.name.clone(), self.requests, fault)
            .with_concurrency(self.concurrency)
    }
}
