//! Retry policy configuration and named presets

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{Failure, FailureKind};

use crate::backoff::Backoff;

/// Predicate over failures
pub type FailurePredicate = Arc<dyn Fn(&Failure) -> bool + Send + Sync>;

/// Predicate matching the given classification tags
pub fn kinds_predicate(kinds: impl IntoIterator<Item = FailureKind>) -> FailurePredicate {
    let kinds: BTreeSet<FailureKind> = kinds.into_iter().collect();
    Arc::new(move |failure: &Failure| kinds.contains(&failure.kind))
}

/// Immutable description of how a call is retried
///
/// Cloning is cheap: predicates are reference counted.
#[derive(Clone)]
pub struct RetryConfig {
    name: String,
    max_attempts: u32,
    backoff: Backoff,
    retry_on: FailurePredicate,
    ignore: Option<FailurePredicate>,
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("ignores", &self.ignore.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryConfig {
    /// Names of the stock presets
    pub const PRESET_NAMES: [&'static str; 6] = [
        "fast",
        "standard",
        "robust",
        "gentle",
        "database-friendly",
        "rate-limit-friendly",
    ];

    /// Policy retrying the default failure set
    ///
    /// A `max_attempts` of zero is treated as one.
    pub fn new(name: impl Into<String>, max_attempts: u32, backoff: Backoff) -> Self {
        Self::builder(name)
            .max_attempts(max_attempts)
            .backoff(backoff)
            .build()
    }

    /// Start building a policy
    pub fn builder(name: impl Into<String>) -> RetryConfigBuilder {
        RetryConfigBuilder::new(name)
    }

    /// Two quick attempts for latency sensitive calls
    pub fn fast() -> Self {
        Self::new("fast", 2, Backoff::exponential(Duration::from_millis(500), 1.5))
    }

    /// Three attempts with doubling waits
    pub fn standard() -> Self {
        Self::new("standard", 3, Backoff::exponential(Duration::from_secs(1), 2.0))
    }

    /// Five attempts with steeply growing waits
    pub fn robust() -> Self {
        Self::new("robust", 5, Backoff::exponential(Duration::from_secs(2), 2.5))
    }

    /// Three attempts with a constant 5s wait
    pub fn gentle() -> Self {
        Self::new("gentle", 3, Backoff::fixed(Duration::from_secs(5)))
    }

    /// Four attempts with randomised, capped waits
    pub fn database_friendly() -> Self {
        Self::new(
            "database-friendly",
            4,
            Backoff::random_exponential(Duration::from_millis(200), 2.0, 0.1, Duration::from_secs(10)),
        )
    }

    /// Three attempts with 5s linear waits
    pub fn rate_limit_friendly() -> Self {
        Self::new("rate-limit-friendly", 3, Backoff::linear(Duration::from_secs(5)))
    }

    /// Look up a stock preset by name
    ///
    /// Matching ignores case and accepts `_` for `-` as well as the short
    /// forms `database` and `rate-limit`.
    pub fn preset(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace('_', "-");
        match key.as_str() {
            "fast" => Some(Self::fast()),
            "standard" => Some(Self::standard()),
            "robust" => Some(Self::robust()),
            "gentle" => Some(Self::gentle()),
            "database-friendly" | "database" => Some(Self::database_friendly()),
            "rate-limit-friendly" | "rate-limit" | "ratelimit" => Some(Self::rate_limit_friendly()),
            _ => None,
        }
    }

    /// Every stock preset
    pub fn presets() -> Vec<Self> {
        Self::PRESET_NAMES
            .iter()
            .filter_map(|name| Self::preset(name))
            .collect()
    }

    /// Same policy under another name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Policy name used in events
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of invocations, at least 1
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff shape between attempts
    pub const fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether the failure is eligible for retry
    pub fn is_retryable(&self, failure: &Failure) -> bool {
        (self.retry_on)(failure)
    }

    /// Whether the failure is passed through as ignored
    pub fn is_ignored(&self, failure: &Failure) -> bool {
        self.ignore.as_ref().is_some_and(|ignore| ignore(failure))
    }
}

/// Builder for [`RetryConfig`]
pub struct RetryConfigBuilder {
    name: String,
    max_attempts: u32,
    backoff: Backoff,
    retry_on: Option<FailurePredicate>,
    ignore: Option<FailurePredicate>,
}

impl RetryConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_attempts: 3,
            backoff: Backoff::default(),
            retry_on: None,
            ignore: None,
        }
    }

    /// Maximum number of invocations (1 disables retry)
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Backoff shape between attempts
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Retry failures carrying one of these tags
    #[must_use]
    pub fn retry_on_kinds(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retry_on = Some(kinds_predicate(kinds));
        self
    }

    /// Retry failures matching an arbitrary predicate
    #[must_use]
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Some(Arc::new(predicate));
        self
    }

    /// Pass through failures carrying one of these tags without retry
    #[must_use]
    pub fn ignore_kinds(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.ignore = Some(kinds_predicate(kinds));
        self
    }

    /// Pass through failures matching an arbitrary predicate without retry
    #[must_use]
    pub fn ignore_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        self.ignore = Some(Arc::new(predicate));
        self
    }

    /// Finish the policy
    pub fn build(self) -> RetryConfig {
        RetryConfig {
            name: self.name,
            max_attempts: self.max_attempts.max(1),
            backoff: self.backoff,
            retry_on: self
                .retry_on
                .unwrap_or_else(|| kinds_predicate(FailureKind::DEFAULT_RETRYABLE)),
            ignore: self.ignore,
        }
    }
}
