//! Fault configuration value object
//!
//! Describes how unreliable one simulated endpoint should be. Every numeric
//! field is normalised into its valid domain when it is set, including when
//! the value arrives through deserialisation: invalid input is clamped, never
//! rejected.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::FaultConfig;
//!
//! let config = FaultConfig::default()
//!     .with_error_rate(1.7)
//!     .with_response_delay_ms(-20)
//!     .with_retry_after_seconds(0);
//!
//! assert!((config.error_rate() - 1.0).abs() < f64::EPSILON);
//! assert_eq!(config.response_delay_ms(), 0);
//! assert_eq!(config.retry_after_seconds(), 1);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Desired unreliability for one simulated endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFaultConfig")]
pub struct FaultConfig {
    error_code: String,
    error_rate: f64,
    response_delay_ms: u64,
    retry_after_seconds: u32,
    timeout_delay_ms: u64,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self::from(RawFaultConfig::default())
    }
}

impl FaultConfig {
    /// Configuration that never fails
    #[must_use]
    pub fn disabled() -> Self {
        Self::default().with_enabled(false)
    }

    /// Configuration that fails every invocation with the given code
    #[must_use]
    pub fn always_failing(error_code: impl Into<String>) -> Self {
        Self::default()
            .with_error_code(error_code)
            .with_error_rate(1.0)
    }

    /// Configuration used when a scenario supplies no explicit fault:
    /// 80% 503s after one second, retry-after five seconds.
    #[must_use]
    pub fn scenario_default() -> Self {
        Self::default()
            .with_error_code("503")
            .with_error_rate(0.8)
            .with_response_delay_ms(1000)
            .with_retry_after_seconds(5)
            .with_description("Default test error configuration")
    }

    /// Raw error code as supplied (e.g. `"503"`)
    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// Probability in `[0, 1]` that an invocation fails
    pub const fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Latency injected before a failure is returned, in milliseconds
    pub const fn response_delay_ms(&self) -> u64 {
        self.response_delay_ms
    }

    /// Latency injected before a failure is returned
    pub const fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    /// Advisory retry-after value surfaced on failure, in seconds (>= 1)
    pub const fn retry_after_seconds(&self) -> u32 {
        self.retry_after_seconds
    }

    /// Additional latency for the timeout failure classes, in milliseconds
    pub const fn timeout_delay_ms(&self) -> u64 {
        self.timeout_delay_ms
    }

    /// Additional latency for the timeout failure classes
    pub const fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_delay_ms)
    }

    /// Whether simulation is active
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Optional scenario label
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the error code
    pub fn set_error_code(&mut self, error_code: impl Into<String>) {
        self.error_code = error_code.into();
    }

    /// Set the error rate, clamped to `[0, 1]` (NaN becomes 0)
    pub fn set_error_rate(&mut self, error_rate: f64) {
        self.error_rate = clamp_rate(error_rate);
    }

    /// Set the response delay, negative values become 0
    pub fn set_response_delay_ms(&mut self, delay_ms: i64) {
        self.response_delay_ms = non_negative(delay_ms);
    }

    /// Set the retry-after value, values below 1 become 1
    pub fn set_retry_after_seconds(&mut self, seconds: i64) {
        self.retry_after_seconds = u32::try_from(seconds.max(1)).unwrap_or(u32::MAX);
    }

    /// Set the timeout delay, negative values become 0
    pub fn set_timeout_delay_ms(&mut self, delay_ms: i64) {
        self.timeout_delay_ms = non_negative(delay_ms);
    }

    /// Enable or disable simulation
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Set the scenario label
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Builder-style [`set_error_code`](Self::set_error_code)
    #[must_use]
    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.set_error_code(error_code);
        self
    }

    /// Builder-style [`set_error_rate`](Self::set_error_rate)
    #[must_use]
    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.set_error_rate(error_rate);
        self
    }

    /// Builder-style [`set_response_delay_ms`](Self::set_response_delay_ms)
    #[must_use]
    pub fn with_response_delay_ms(mut self, delay_ms: i64) -> Self {
        self.set_response_delay_ms(delay_ms);
        self
    }

    /// Builder-style [`set_retry_after_seconds`](Self::set_retry_after_seconds)
    #[must_use]
    pub fn with_retry_after_seconds(mut self, seconds: i64) -> Self {
        self.set_retry_after_seconds(seconds);
        self
    }

    /// Builder-style [`set_timeout_delay_ms`](Self::set_timeout_delay_ms)
    #[must_use]
    pub fn with_timeout_delay_ms(mut self, delay_ms: i64) -> Self {
        self.set_timeout_delay_ms(delay_ms);
        self
    }

    /// Builder-style [`set_enabled`](Self::set_enabled)
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    /// Builder-style [`set_description`](Self::set_description)
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(description);
        self
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Wire shape of [`FaultConfig`]; signed fields so out-of-range input can be clamped
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
struct RawFaultConfig {
    #[serde(alias = "errorCode")]
    error_code: String,
    #[serde(alias = "errorRate")]
    error_rate: f64,
    #[serde(alias = "responseDelayMs")]
    response_delay_ms: i64,
    #[serde(alias = "retryAfterSeconds")]
    retry_after_seconds: i64,
    #[serde(alias = "timeoutDelayMs")]
    timeout_delay_ms: i64,
    enabled: bool,
    description: Option<String>,
}

impl Default for RawFaultConfig {
    fn default() -> Self {
        Self {
            error_code: "503".to_string(),
            error_rate: 1.0,
            response_delay_ms: 0,
            retry_after_seconds: 30,
            timeout_delay_ms: 5000,
            enabled: true,
            description: None,
        }
    }
}

impl From<RawFaultConfig> for FaultConfig {
    fn from(raw: RawFaultConfig) -> Self {
        let mut config = Self {
            error_code: raw.error_code,
            error_rate: 0.0,
            response_delay_ms: 0,
            retry_after_seconds: 1,
            timeout_delay_ms: 0,
            enabled: raw.enabled,
            description: raw.description,
        };
        config.set_error_rate(raw.error_rate);
        config.set_response_delay_ms(raw.response_delay_ms);
        config.set_retry_after_seconds(raw.retry_after_seconds);
        config.set_timeout_delay_ms(raw.timeout_delay_ms);
        config
    }
}
