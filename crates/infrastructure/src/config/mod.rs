//! Application configuration
//!
//! Layered with the `config` crate, later sources winning:
//! 1. built-in defaults
//! 2. `resilience.toml` in the working directory (or an explicit file)
//! 3. `RESILIENCE_*` environment variables, `__` separating sections
//!    (e.g. `RESILIENCE_FAULT__ERROR_RATE=0.5`)
//!
//! Sub-modules:
//! - `scenario`: scenario runner settings

mod scenario;

use std::collections::BTreeMap;
use std::path::Path;

use domain::{DomainError, FaultConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::retry::{PolicyCatalog, PolicySpec};
use crate::telemetry::TelemetryConfig;

pub use scenario::ScenarioConfig;

/// Base name of the optional configuration file
pub const CONFIG_FILE: &str = "resilience";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "RESILIENCE";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Unreliability of the simulated endpoint
    #[serde(default = "FaultConfig::scenario_default")]
    pub fault: FaultConfig,

    /// Named policies, overlaid on the stock presets
    #[serde(default)]
    pub policies: BTreeMap<String, PolicySpec>,

    /// Scenario runner settings
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fault: FaultConfig::scenario_default(),
            policies: BTreeMap::new(),
            scenario: ScenarioConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional `resilience.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of `resilience.toml`
    ///
    /// An explicit file must exist; the default one is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            // Start with defaults
            .set_default("scenario.policy", "standard")?
            .set_default("telemetry.log_filter", "info")?
            // Load from file if exists
            .add_source(file)
            // Override with environment variables (e.g., RESILIENCE_SCENARIO__REQUESTS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(
            policies = config.policies.len(),
            scenario_policy = %config.scenario.policy,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Stock presets overlaid with the configured policies
    pub fn policy_catalog(&self) -> Result<PolicyCatalog, DomainError> {
        PolicyCatalog::from_specs(&self.policies)
    }

    /// Check cross-section consistency
    pub fn validate(&self) -> Result<(), DomainError> {
        let catalog = self.policy_catalog()?;
        catalog.get(&self.scenario.policy)?;
        if self.scenario.requests == 0 {
            return Err(DomainError::InvalidConfiguration(
                "scenario.requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
