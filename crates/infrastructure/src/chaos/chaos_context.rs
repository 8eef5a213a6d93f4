//! Chaos context for tracking fault injection statistics.

use std::time::Duration;

use domain::ErrorCode;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Result of a fault injection decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionResult {
    /// The call proceeds normally
    NoInjection,
    /// A fault is injected
    Injected,
    /// Injection is disabled for this configuration
    Skipped,
}

/// Statistics about fault injection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosStats {
    /// Total number of calls processed
    pub total_calls: u64,
    /// Number of faults injected
    pub faults_injected: u64,
    /// Number of calls that passed through without a fault
    pub calls_skipped: u64,
    /// Number of server error faults injected
    pub errors_injected: u64,
    /// Number of timeout faults injected
    pub timeouts_injected: u64,
    /// Number of rate limit faults injected
    pub rate_limits_injected: u64,
    /// Total latency added (milliseconds)
    pub total_latency_added_ms: u64,
}

impl ChaosStats {
    /// Calculate the observed fault rate
    #[allow(clippy::cast_precision_loss)]
    pub fn actual_fault_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.faults_injected as f64 / self.total_calls as f64
        }
    }
}

/// Shared fault injection state
///
/// All recording methods take `&self`, so one context can back an injector
/// used from many tasks at once. Locks are only held for the counter update.
#[derive(Debug, Default)]
pub struct ChaosContext {
    stats: Mutex<ChaosStats>,
}

impl ChaosContext {
    /// Create a new chaos context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call being processed
    pub fn record_call(&self) {
        self.stats.lock().total_calls += 1;
    }

    /// Record a call that went through without a fault
    pub fn record_pass(&self) {
        self.stats.lock().calls_skipped += 1;
    }

    /// Record an injected fault of the given class
    pub fn record_fault(&self, code: ErrorCode, latency: Duration) {
        let mut stats = self.stats.lock();
        stats.faults_injected += 1;
        match code {
            ErrorCode::GatewayTimeout | ErrorCode::RequestTimeout => {
                stats.timeouts_injected += 1;
            },
            ErrorCode::TooManyRequests => stats.rate_limits_injected += 1,
            ErrorCode::ServiceUnavailable | ErrorCode::InternalError | ErrorCode::BadGateway => {
                stats.errors_injected += 1;
            },
        }
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        stats.total_latency_added_ms = stats.total_latency_added_ms.saturating_add(latency_ms);
    }

    /// Get a copy of current statistics
    pub fn stats_snapshot(&self) -> ChaosStats {
        self.stats.lock().clone()
    }

    /// Reset statistics
    pub fn reset(&self) {
        *self.stats.lock() = ChaosStats::default();
    }
}
