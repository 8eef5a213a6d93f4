//! Fault injector for resilience testing.
//!
//! Decides per call whether a simulated endpoint fails, with which failure
//! class, and after how much injected latency.

use std::future::Future;
use std::time::Duration;

use application::ports::FaultSimulatorPort;
use async_trait::async_trait;
use domain::{ErrorCode, Failure, FaultConfig, SimulatedFailure, SimulatedSuccess};
use rand::Rng;
use tracing::{debug, warn};

use super::{ChaosContext, ChaosStats, InjectionResult};

/// Fault injector for simulating an unreliable endpoint
///
/// The injector holds no per-call state: every decision draws from the
/// calling thread's RNG, and only the statistics are shared.
#[derive(Debug, Default)]
pub struct FaultInjector {
    context: ChaosContext,
}

impl FaultInjector {
    /// Create a new fault injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a call with this configuration fails
    pub fn decide(config: &FaultConfig) -> InjectionResult {
        if !config.is_enabled() {
            return InjectionResult::Skipped;
        }

        let rate = config.error_rate();
        let fail = if rate <= 0.0 {
            false
        } else if rate >= 1.0 {
            true
        } else {
            rand::rng().random::<f64>() < rate
        };

        if fail {
            InjectionResult::Injected
        } else {
            InjectionResult::NoInjection
        }
    }

    /// Map a configured error code to its failure class
    ///
    /// Unrecognised codes fall back to `INTERNAL_ERROR`.
    pub fn resolve_error_code(code: &str) -> ErrorCode {
        code.parse().unwrap_or_else(|_| {
            warn!(error_code = %code, "Unknown error code, using INTERNAL_ERROR");
            ErrorCode::InternalError
        })
    }

    /// Latency injected before a failure of the given class is returned
    pub fn injected_delay(config: &FaultConfig, code: ErrorCode) -> Duration {
        if code.is_timeout() {
            config.response_delay().saturating_add(config.timeout_delay())
        } else {
            config.response_delay()
        }
    }

    /// Simulate one call to the unreliable endpoint
    pub async fn simulate(
        &self,
        config: &FaultConfig,
    ) -> Result<SimulatedSuccess, SimulatedFailure> {
        self.context.record_call();

        if Self::decide(config) != InjectionResult::Injected {
            self.context.record_pass();
            return Ok(SimulatedSuccess::available());
        }

        let code = Self::resolve_error_code(config.error_code());
        let delay = Self::injected_delay(config, code);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.context.record_fault(code, delay);

        debug!(
            error_code = %code,
            delay_ms = delay.as_millis(),
            retry_after_s = config.retry_after_seconds(),
            "Injected fault"
        );
        Err(SimulatedFailure::new(code, config.retry_after_seconds(), delay))
    }

    /// Wrap an async operation with potential fault injection
    ///
    /// When a fault is drawn the operation is never polled and the simulated
    /// failure is returned in its place.
    pub async fn wrap<F, T>(&self, config: &FaultConfig, operation: F) -> Result<T, Failure>
    where
        F: Future<Output = Result<T, Failure>>,
    {
        match self.simulate(config).await {
            Ok(_) => operation.await,
            Err(failure) => Err(failure.into()),
        }
    }

    /// Get a snapshot of current statistics
    pub fn stats(&self) -> ChaosStats {
        self.context.stats_snapshot()
    }

    /// Reset the injector statistics
    pub fn reset(&self) {
        self.context.reset();
    }
}

#[async_trait]
impl FaultSimulatorPort for FaultInjector {
    async fn simulate(
        &self,
        config: &FaultConfig,
    ) -> Result<SimulatedSuccess, SimulatedFailure> {
        Self::simulate(self, config).await
    }
}
