//! Named retry policies
//!
//! A [`PolicyCatalog`] is an explicit name -> policy map handed to whoever
//! needs to look policies up. Configuration files describe entries with a
//! [`PolicySpec`]:
//!
//! ```toml
//! [policies.checkout]
//! preset = "robust"
//!
//! [policies.inventory]
//! max_attempts = 4
//! backoff = { type = "fixed", delay_ms = 250 }
//! retry_on = ["timeout", "http-5xx"]
//! ignore = ["http-4xx"]
//! ```

use std::collections::BTreeMap;

use domain::{DomainError, FailureKind};
use serde::{Deserialize, Serialize};

use super::RetryConfig;
use crate::backoff::Backoff;

/// Configuration form of a retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicySpec {
    /// A stock preset, renamed to the entry's key
    Preset {
        /// Preset name
        preset: String,
    },
    /// A policy spelled out in full
    Inline {
        /// Maximum number of invocations
        max_attempts: u32,
        /// Backoff shape
        #[serde(default)]
        backoff: Backoff,
        /// Tags eligible for retry; the default set when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_on: Option<Vec<FailureKind>>,
        /// Tags passed through without retry
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        ignore: Vec<FailureKind>,
    },
}

impl PolicySpec {
    /// Build the policy this spec describes under `name`
    pub fn resolve(&self, name: &str) -> Result<RetryConfig, DomainError> {
        match self {
            Self::Preset { preset } => RetryConfig::preset(preset)
                .map(|config| config.with_name(name))
                .ok_or_else(|| DomainError::policy_not_found(preset.as_str())),
            Self::Inline {
                max_attempts,
                backoff,
                retry_on,
                ignore,
            } => {
                if *max_attempts == 0 {
                    return Err(DomainError::InvalidConfiguration(format!(
                        "policy '{name}' needs max_attempts >= 1"
                    )));
                }
                backoff.validate()?;

                let mut builder = RetryConfig::builder(name)
                    .max_attempts(*max_attempts)
                    .backoff(backoff.clone());
                if let Some(kinds) = retry_on {
                    builder = builder.retry_on_kinds(kinds.iter().copied());
                }
                if !ignore.is_empty() {
                    builder = builder.ignore_kinds(ignore.iter().copied());
                }
                Ok(builder.build())
            },
        }
    }
}

/// Explicit registry of named retry policies
#[derive(Debug, Clone, Default)]
pub struct PolicyCatalog {
    policies: BTreeMap<String, RetryConfig>,
}

impl PolicyCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the six stock presets
    pub fn with_presets() -> Self {
        let mut catalog = Self::new();
        for config in RetryConfig::presets() {
            catalog.insert(config);
        }
        catalog
    }

    /// Stock presets overlaid with the given specs
    ///
    /// A spec whose name matches a preset replaces it.
    pub fn from_specs(specs: &BTreeMap<String, PolicySpec>) -> Result<Self, DomainError> {
        let mut catalog = Self::with_presets();
        for (name, spec) in specs {
            catalog.insert(spec.resolve(name)?);
        }
        Ok(catalog)
    }

    /// Add or replace a policy under its own name
    pub fn insert(&mut self, config: RetryConfig) {
        self.policies.insert(config.name().to_string(), config);
    }

    /// Look a policy up by name
    pub fn get(&self, name: &str) -> Result<&RetryConfig, DomainError> {
        self.policies
            .get(name)
            .ok_or_else(|| DomainError::policy_not_found(name))
    }

    /// Whether a policy with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Policy names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Policies in name order
    pub fn iter(&self) -> impl Iterator<Item = &RetryConfig> {
        self.policies.values()
    }

    /// Number of policies
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
