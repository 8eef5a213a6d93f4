//! Integration tests for the retry engine driving the fault injector
//!
//! Tests cover:
//! - Feedback loop between policy and simulated endpoint
//! - Event streams seen by observers
//! - Scenario runs through the application service
//! - Policies loaded from configuration

use std::sync::Arc;
use std::time::Duration;

use application::ports::RetryObserverPort;
use application::{ApplicationError, ResilienceTestService, ScenarioRequest};
use domain::{ErrorCode, ErrorReason, Failure, FailureKind, FaultConfig, RetryEventType};
use infrastructure::{
    Backoff, FaultInjectionClient, FaultInjector, PolicyCatalog, RecordingObserver, RetryConfig,
    RetryError, RetryPolicy, TracingRetryObserver,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn observed(config: RetryConfig) -> (RetryPolicy, Arc<RecordingObserver>) {
    let recorder = Arc::new(RecordingObserver::new());
    let policy = RetryPolicy::new(config)
        .with_observer(recorder.clone())
        .with_observer(Arc::new(TracingRetryObserver::new()));
    (policy, recorder)
}

// ============================================================================
// Engine + Injector
// ============================================================================

mod feedback_loop_tests {
    use super::*;

    #[tokio::test]
    async fn always_failing_endpoint_exhausts_standard_policy() {
        tokio::time::pause();
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("503");
        let (policy, recorder) = observed(RetryConfig::standard());

        let start = Instant::now();
        let err = policy
            .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 3);
        assert!(err.is_exhausted());
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(injector.stats().total_calls, 3);
        assert_eq!(injector.stats().faults_injected, 3);

        let summary = recorder.summary();
        assert_eq!(summary.retries, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.successes, 0);
    }

    #[tokio::test]
    async fn healthy_endpoint_needs_one_attempt() {
        let injector = FaultInjector::new();
        let fault = FaultConfig::default().with_error_rate(0.0);
        let (policy, recorder) = observed(RetryConfig::robust());

        let data = policy
            .execute(|| async {
                injector
                    .simulate(&fault)
                    .await
                    .map(|s| s.data)
                    .map_err(Failure::from)
            })
            .await
            .unwrap();

        assert_eq!(data, "Resource successfully retrieved");
        assert_eq!(recorder.count(RetryEventType::Success), 1);
        assert_eq!(recorder.events()[0].attempts(), 1);
    }

    #[tokio::test]
    async fn injected_latency_counts_toward_elapsed_time() {
        tokio::time::pause();
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("502").with_response_delay_ms(300);
        let config = RetryConfig::new("two", 2, Backoff::fixed(Duration::from_millis(100)));

        let start = Instant::now();
        let _ = RetryPolicy::new(config)
            .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
            .await;

        // two injected delays and one backoff wait
        assert!(start.elapsed() >= Duration::from_millis(700));
        assert_eq!(injector.stats().total_latency_added_ms, 600);
    }

    #[tokio::test]
    async fn timeout_class_is_retryable_by_default() {
        tokio::time::pause();
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("504").with_timeout_delay_ms(50);
        let (policy, recorder) = observed(RetryConfig::fast());

        let err = policy
            .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
            .await
            .unwrap_err();

        assert_eq!(err.failure().map(|f| f.kind), Some(FailureKind::Timeout));
        assert_eq!(err.attempts(), 2);
        assert_eq!(injector.stats().timeouts_injected, 2);
        assert_eq!(recorder.count(RetryEventType::Retry), 1);
    }

    #[tokio::test]
    async fn unknown_error_code_becomes_internal_error() {
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("418");

        let failure = injector.simulate(&fault).await.unwrap_err();
        assert_eq!(failure.error_code, ErrorCode::InternalError);
        assert_eq!(failure.status(), 500);
    }

    #[tokio::test]
    async fn rate_limit_failure_carries_retry_after() {
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("429").with_retry_after_seconds(12);
        let policy = RetryPolicy::new(
            RetryConfig::builder("no-429")
                .retry_on_kinds(Vec::<FailureKind>::new())
                .build(),
        );

        let err = policy
            .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
            .await
            .unwrap_err();

        match err {
            RetryError::NonRetryable { attempts, failure } => {
                assert_eq!(attempts, 1);
                assert_eq!(failure.kind, FailureKind::RateLimited);
                assert_eq!(failure.retry_after, Some(Duration::from_secs(12)));
            },
            other => panic!("unexpected outcome: {other}"),
        }
    }

    #[tokio::test]
    async fn exhausted_event_is_last_and_carries_reason() {
        tokio::time::pause();
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("500");
        let (policy, recorder) = observed(RetryConfig::gentle());

        let _ = policy
            .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
            .await;

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        let last = events.last().unwrap();
        assert_eq!(last.error_reason(), Some(ErrorReason::Exhausted));
        assert_eq!(last.attempts(), 3);
        assert!(!last.outcome.is_success());
        assert_eq!(last.failure().and_then(|f| f.status), Some(500));
    }
}

// ============================================================================
// Scenario Runs
// ============================================================================

mod scenario_tests {
    use super::*;

    fn service(policy: RetryPolicy, fallback: Option<&str>) -> ResilienceTestService {
        let mut client = FaultInjectionClient::new(Arc::new(FaultInjector::new()), policy);
        if let Some(message) = fallback {
            client = client.with_fallback(message);
        }
        ResilienceTestService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn dead_endpoint_scenario_reports_every_failure() {
        tokio::time::pause();
        let svc = service(RetryPolicy::new(RetryConfig::fast()), None);
        let request = ScenarioRequest::new("dead", 5, FaultConfig::always_failing("503"))
            .with_concurrency(5);

        let report = svc.run_scenario(&request).await.unwrap();

        assert_eq!(report.policy, "fast");
        assert_eq!(report.failed, 5);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.total_attempts, 10);
        assert_eq!(report.failures.get("http-5xx"), Some(&5));
    }

    #[tokio::test]
    async fn fallback_turns_failures_into_degraded_answers() {
        tokio::time::pause();
        let svc = service(RetryPolicy::new(RetryConfig::fast()), Some("cached"));
        let request = ScenarioRequest::new("degraded", 4, FaultConfig::always_failing("502"));

        let report = svc.run_scenario(&request).await.unwrap();

        assert_eq!(report.degraded, 4);
        assert_eq!(report.failed, 0);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn healthy_scenario_succeeds_on_first_attempts() {
        let svc = service(RetryPolicy::new(RetryConfig::standard()), None);
        let request = ScenarioRequest::new("healthy", 8, FaultConfig::disabled()).with_concurrency(3);

        let report = svc.run_scenario(&request).await.unwrap();

        assert_eq!(report.succeeded, 8);
        assert_eq!(report.total_attempts, 8);
        assert!((report.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn single_call_surfaces_application_error() {
        let svc = service(
            RetryPolicy::new(
                RetryConfig::builder("strict")
                    .retry_on_kinds(Vec::<FailureKind>::new())
                    .build(),
            ),
            None,
        );

        let err = svc
            .call_once("single", &FaultConfig::always_failing("503"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotRetried { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn interrupted_scenario_counts_cancelled_requests() {
        tokio::time::pause();
        let recorder = Arc::new(RecordingObserver::new());
        let policy = RetryPolicy::new(RetryConfig::standard()).with_observer(recorder.clone());
        let svc = service(policy, None);
        let request = ScenarioRequest::new("interrupted", 4, FaultConfig::always_failing("503"));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        let report = svc
            .run_scenario_with_cancellation(&request, &token)
            .await
            .unwrap();

        // the first request is cut off during its backoff, the rest never start
        assert_eq!(report.requests, 4);
        assert_eq!(report.failed, 4);
        assert_eq!(report.failures.get("cancelled"), Some(&4));
        assert_eq!(report.total_attempts, 2);
        assert_eq!(recorder.summary().errors, 4);
        assert!(
            recorder
                .events()
                .iter()
                .filter(|e| e.event_type() == RetryEventType::Error)
                .all(|e| e.error_reason() == Some(ErrorReason::Cancelled))
        );
    }

    #[tokio::test]
    async fn observers_see_all_scenario_events() {
        tokio::time::pause();
        let recorder = Arc::new(RecordingObserver::new());
        let observers: Vec<Arc<dyn RetryObserverPort>> = vec![recorder.clone()];
        let policy = RetryPolicy::new(RetryConfig::fast()).with_observers(observers);
        let svc = service(policy, None);

        let request = ScenarioRequest::new("observed", 3, FaultConfig::always_failing("503"));
        let _ = svc.run_scenario(&request).await.unwrap();

        let summary = recorder.summary();
        assert_eq!(summary.retries, 3);
        assert_eq!(summary.errors, 3);
    }
}

// ============================================================================
// Catalog-driven Policies
// ============================================================================

mod catalog_tests {
    use super::*;

    #[tokio::test]
    async fn catalog_policies_drive_the_engine() {
        tokio::time::pause();
        let catalog = PolicyCatalog::with_presets();
        let injector = FaultInjector::new();
        let fault = FaultConfig::always_failing("503");

        for config in catalog.iter() {
            injector.reset();
            let expected = config.max_attempts();
            let err = RetryPolicy::new(config.clone())
                .execute(|| async { injector.simulate(&fault).await.map_err(Failure::from) })
                .await
                .unwrap_err();
            assert_eq!(err.attempts(), expected, "{}", config.name());
            assert_eq!(injector.stats().total_calls, u64::from(expected));
        }
    }
}
