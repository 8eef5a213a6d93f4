//! Resilience test service
//!
//! Drives test scenarios: a burst of logical requests against a simulated
//! endpoint, each protected by the retry policy behind a
//! [`ResilientCallPort`], and a summary of how the policy coped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use domain::FaultConfig;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{CallResponse, ResilientCallPort};
use crate::request_context::RequestContext;

/// Parameters of one test scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Scenario label used in logs and request contexts
    pub name: String,
    /// Number of logical requests to issue
    pub requests: u32,
    /// Maximum number of requests in flight at once
    pub concurrency: usize,
    /// Unreliability of the simulated endpoint
    pub fault: FaultConfig,
}

impl ScenarioRequest {
    /// Sequential scenario with the given number of requests
    pub fn new(name: impl Into<String>, requests: u32, fault: FaultConfig) -> Self {
        Self {
            name: name.into(),
            requests,
            concurrency: 1,
            fault,
        }
    }

    /// Allow up to `concurrency` requests in flight
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Outcome summary of a scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario label
    pub scenario: String,
    /// Retry policy that protected the calls
    pub policy: String,
    /// Requests issued
    pub requests: u32,
    /// Requests answered by the endpoint
    pub succeeded: u32,
    /// Requests answered by the fallback
    pub degraded: u32,
    /// Requests that ended in an error
    pub failed: u32,
    /// Invocations across all requests
    pub total_attempts: u64,
    /// Terminal failures by classification tag
    pub failures: BTreeMap<String, u32>,
    /// Wall-clock duration of the scenario
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Share of requests answered by the endpoint itself
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            f64::from(self.succeeded) / f64::from(self.requests)
        }
    }

    /// Mean number of invocations per request
    #[allow(clippy::cast_precision_loss)]
    pub fn average_attempts(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.total_attempts as f64 / f64::from(self.requests)
        }
    }

    fn record(&mut self, result: &Result<CallResponse, ApplicationError>) {
        match result {
            Ok(response) => {
                if response.degraded {
                    self.degraded += 1;
                } else {
                    self.succeeded += 1;
                }
                self.total_attempts += u64::from(response.attempts);
            },
            Err(err) => {
                self.failed += 1;
                self.total_attempts += u64::from(err.attempts().unwrap_or(0));
                let tag = match (err, err.failure()) {
                    (_, Some(failure)) => failure.kind.to_string(),
                    (ApplicationError::Cancelled { .. }, None) => "cancelled".to_string(),
                    _ => "other".to_string(),
                };
                *self.failures.entry(tag).or_insert(0) += 1;
            },
        }
    }
}

/// Runs resilience scenarios against a protected endpoint
pub struct ResilienceTestService {
    client: Arc<dyn ResilientCallPort>,
}

impl std::fmt::Debug for ResilienceTestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceTestService")
            .field("policy", &self.client.policy_name())
            .finish()
    }
}

impl ResilienceTestService {
    /// Create a service around a protected client
    pub fn new(client: Arc<dyn ResilientCallPort>) -> Self {
        Self { client }
    }

    /// Issue a single call
    #[instrument(skip(self, fault), fields(policy = %self.client.policy_name()))]
    pub async fn call_once(
        &self,
        scenario: &str,
        fault: &FaultConfig,
    ) -> Result<CallResponse, ApplicationError> {
        let ctx = RequestContext::new(scenario, 0);
        let result = self.client.call(&ctx, fault).await;
        match &result {
            Ok(response) => debug!(
                attempts = response.attempts,
                degraded = response.degraded,
                "Call completed"
            ),
            Err(e) => warn!(error = %e, "Call failed"),
        }
        result
    }

    /// Run a scenario and summarise the outcomes
    ///
    /// Individual call failures are part of the report; only an unusable
    /// scenario definition is returned as an error.
    pub async fn run_scenario(
        &self,
        request: &ScenarioRequest,
    ) -> Result<ScenarioReport, ApplicationError> {
        self.run_scenario_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Run a scenario that stops early once `token` is cancelled
    ///
    /// In-flight calls end with a cancellation failure and requests not yet
    /// issued are reported as cancelled without calling the endpoint, so the
    /// report still accounts for every request.
    #[instrument(skip(self, request, token), fields(scenario = %request.name, requests = request.requests))]
    pub async fn run_scenario_with_cancellation(
        &self,
        request: &ScenarioRequest,
        token: &CancellationToken,
    ) -> Result<ScenarioReport, ApplicationError> {
        if request.requests == 0 {
            return Err(ApplicationError::Configuration(
                "scenario needs at least one request".to_string(),
            ));
        }

        let concurrency = request.concurrency.max(1);
        info!(
            concurrency,
            error_code = request.fault.error_code(),
            error_rate = request.fault.error_rate(),
            delay_ms = request.fault.response_delay_ms(),
            "Starting scenario"
        );

        let start = Instant::now();
        let results: Vec<Result<CallResponse, ApplicationError>> = stream::iter(0..request.requests)
            .map(|sequence| {
                let client = Arc::clone(&self.client);
                let ctx = RequestContext::new(&request.name, sequence)
                    .with_cancellation(token.clone());
                let fault = request.fault.clone();
                async move { client.call(&ctx, &fault).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = ScenarioReport {
            scenario: request.name.clone(),
            policy: self.client.policy_name(),
            requests: request.requests,
            ..ScenarioReport::default()
        };
        for result in &results {
            report.record(result);
        }
        if token.is_cancelled() {
            warn!(
                cancelled = report.failures.get("cancelled").copied().unwrap_or(0),
                "Scenario cancelled"
            );
        }
        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            succeeded = report.succeeded,
            degraded = report.degraded,
            failed = report.failed,
            total_attempts = report.total_attempts,
            elapsed_ms = report.elapsed_ms,
            "Scenario finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use domain::Failure;

    use super::*;
    use crate::ports::MockResilientCallPort;

    fn ok_response(attempts: u32) -> CallResponse {
        CallResponse {
            body: "ok".to_string(),
            attempts,
            degraded: false,
        }
    }

    fn service(mock: MockResilientCallPort) -> ResilienceTestService {
        ResilienceTestService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn zero_requests_is_a_configuration_error() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call().never();
        let svc = service(mock);

        let result = svc
            .run_scenario(&ScenarioRequest::new("empty", 0, FaultConfig::default()))
            .await;
        assert!(matches!(result, Err(ApplicationError::Configuration(_))));
    }

    #[tokio::test]
    async fn every_request_is_issued_once() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call().times(5).returning(|_, _| Ok(ok_response(1)));
        mock.expect_policy_name().returning(|| "standard".to_string());
        let svc = service(mock);

        let report = svc
            .run_scenario(&ScenarioRequest::new("burst", 5, FaultConfig::disabled()))
            .await
            .unwrap();

        assert_eq!(report.requests, 5);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total_attempts, 5);
        assert_eq!(report.policy, "standard");
        assert!((report.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn outcomes_are_tallied_by_kind() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = Arc::clone(&counter);

        let mut mock = MockResilientCallPort::new();
        mock.expect_call().times(4).returning(move |_, _| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(ok_response(2)),
                1 => Ok(CallResponse {
                    body: "fallback".to_string(),
                    attempts: 3,
                    degraded: true,
                }),
                2 => Err(ApplicationError::RetriesExhausted {
                    attempts: 3,
                    failure: Failure::http(503, "Service Unavailable"),
                }),
                _ => Err(ApplicationError::Cancelled { attempts: 1 }),
            }
        });
        mock.expect_policy_name().returning(|| "robust".to_string());
        let svc = service(mock);

        let report = svc
            .run_scenario(&ScenarioRequest::new("mixed", 4, FaultConfig::default()))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.degraded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.total_attempts, 2 + 3 + 3 + 1);
        assert_eq!(report.failures.get("http-5xx"), Some(&1));
        assert_eq!(report.failures.get("cancelled"), Some(&1));
        assert!((report.average_attempts() - 2.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn concurrent_scenario_issues_all_requests() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call().times(20).returning(|_, _| Ok(ok_response(1)));
        mock.expect_policy_name().returning(|| "fast".to_string());
        let svc = service(mock);

        let request =
            ScenarioRequest::new("parallel", 20, FaultConfig::disabled()).with_concurrency(8);
        let report = svc.run_scenario(&request).await.unwrap();
        assert_eq!(report.succeeded, 20);
    }

    #[tokio::test]
    async fn cancelled_scenario_still_reports_every_request() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call().times(3).returning(|ctx, _| {
            if ctx.is_cancelled() {
                Err(ApplicationError::Cancelled { attempts: 0 })
            } else {
                Ok(ok_response(1))
            }
        });
        mock.expect_policy_name().returning(|| "standard".to_string());
        let svc = service(mock);

        let token = CancellationToken::new();
        token.cancel();
        let report = svc
            .run_scenario_with_cancellation(
                &ScenarioRequest::new("interrupted", 3, FaultConfig::default()),
                &token,
            )
            .await
            .unwrap();

        assert_eq!(report.requests, 3);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 3);
        assert_eq!(report.failures.get("cancelled"), Some(&3));
    }

    #[tokio::test]
    async fn uncancelled_token_runs_normally() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call()
            .times(2)
            .withf(|ctx, _| !ctx.is_cancelled())
            .returning(|_, _| Ok(ok_response(1)));
        mock.expect_policy_name().returning(|| "standard".to_string());
        let svc = service(mock);

        let report = svc
            .run_scenario_with_cancellation(
                &ScenarioRequest::new("calm", 2, FaultConfig::default()),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn call_once_passes_errors_through() {
        let mut mock = MockResilientCallPort::new();
        mock.expect_call().times(1).returning(|_, _| {
            Err(ApplicationError::NotRetried {
                attempts: 1,
                failure: Failure::http(404, "Not Found"),
            })
        });
        mock.expect_policy_name().returning(|| "standard".to_string());
        let svc = service(mock);

        let err = svc.call_once("single", &FaultConfig::default()).await.unwrap_err();
        assert_eq!(err.attempts(), Some(1));
    }

    #[test]
    fn empty_report_rates_are_zero() {
        let report = ScenarioReport::default();
        assert!(report.success_rate().abs() < f64::EPSILON);
        assert!(report.average_attempts().abs() < f64::EPSILON);
    }
}
