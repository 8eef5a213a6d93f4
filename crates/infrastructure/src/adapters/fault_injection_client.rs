//! Resilient client for a simulated endpoint
//!
//! Calls a [`FaultSimulatorPort`] through a [`RetryPolicy`], optionally
//! answering with a degraded message once retries are exhausted. The retry
//! loop stops when the request context is cancelled.

use std::sync::Arc;

use application::{
    ApplicationError, RequestContext,
    ports::{CallResponse, FaultSimulatorPort, ResilientCallPort},
};
use async_trait::async_trait;
use domain::{Failure, FaultConfig};
use tracing::{debug, instrument};

use crate::retry::RetryPolicy;

/// Degraded answer handed out when every attempt failed
fn degraded_body(message: &str, ctx: &RequestContext, failure: &Failure) -> String {
    format!(
        "{message} [{}#{}] last failure: {failure}",
        ctx.scenario(),
        ctx.sequence()
    )
}

/// [`ResilientCallPort`] backed by a fault simulator and a retry policy
pub struct FaultInjectionClient {
    simulator: Arc<dyn FaultSimulatorPort>,
    policy: RetryPolicy,
    fallback_message: Option<String>,
}

impl std::fmt::Debug for FaultInjectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInjectionClient")
            .field("policy", &self.policy)
            .field("fallback_message", &self.fallback_message)
            .finish_non_exhaustive()
    }
}

impl FaultInjectionClient {
    /// Create a client without fallback
    pub fn new(simulator: Arc<dyn FaultSimulatorPort>, policy: RetryPolicy) -> Self {
        Self {
            simulator,
            policy,
            fallback_message: None,
        }
    }

    /// Answer exhausted calls with a degraded message instead of an error
    #[must_use]
    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = Some(message.into());
        self
    }

    /// The retry policy protecting the calls
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl ResilientCallPort for FaultInjectionClient {
    #[instrument(skip(self, ctx, fault), fields(request_id = %ctx.request_id(), sequence = ctx.sequence()))]
    async fn call(
        &self,
        ctx: &RequestContext,
        fault: &FaultConfig,
    ) -> Result<CallResponse, ApplicationError> {
        let simulator = &self.simulator;
        let operation = move || async move {
            simulator
                .simulate(fault)
                .await
                .map(|success| success.data)
                .map_err(Failure::from)
        };

        let outcome = match &self.fallback_message {
            Some(message) => {
                self.policy
                    .execute_with_fallback(ctx, operation, |ctx, failure| {
                        degraded_body(message, ctx, failure)
                    })
                    .await
            },
            None => {
                self.policy
                    .execute_detailed_with_cancellation(operation, ctx.cancellation())
                    .await
            },
        };

        debug!(
            attempts = outcome.attempts,
            degraded = outcome.fallback_used,
            ok = outcome.is_ok(),
            "Resilient call finished"
        );

        let attempts = outcome.attempts;
        let degraded = outcome.fallback_used;
        let body = outcome.into_result()?;
        Ok(CallResponse {
            body,
            attempts,
            degraded,
        })
    }

    fn policy_name(&self) -> String {
        self.policy.name().to_string()
    }
}
