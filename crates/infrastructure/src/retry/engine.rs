//! Retry policy engine
//!
//! Runs a failable async operation under a [`RetryConfig`]: classifies each
//! failure, waits per the backoff shape, enforces the attempt cap and tells
//! every registered observer what happened.
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryConfig, RetryPolicy};
//!
//! let policy = RetryPolicy::new(RetryConfig::standard());
//! let body = policy.execute(|| async { upstream.fetch().await }).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use application::RequestContext;
use application::ports::RetryObserverPort;
use domain::{AttemptOutcome, ErrorReason, Failure, RetryEvent};
use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{RetryConfig, RetryError};

/// Retry result containing the outcome and metadata about the loop
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the operation
    pub result: Result<T, E>,
    /// Number of invocations started (1 = no retries, 2 = one retry, etc.)
    pub attempts: u32,
    /// Total time spent including waits
    pub total_duration: Duration,
    /// Whether the value came from a fallback rather than the operation
    pub fallback_used: bool,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the operation failed
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// A retry configuration bound to its observers
///
/// The policy holds no per-call state, so one instance can serve any number
/// of concurrent calls.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    observers: Vec<Arc<dyn RetryObserverPort>>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl RetryPolicy {
    /// Create a policy without observers
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Register an observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserverPort>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Register several observers
    #[must_use]
    pub fn with_observers(
        mut self,
        observers: impl IntoIterator<Item = Arc<dyn RetryObserverPort>>,
    ) -> Self {
        self.observers.extend(observers);
        self
    }

    /// The underlying configuration
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Policy name used in events
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Run the operation until it succeeds or the policy gives up
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.execute_detailed(operation).await.into_result()
    }

    /// Like [`execute`](Self::execute), keeping attempt count and duration
    pub async fn execute_detailed<F, Fut, T>(&self, operation: F) -> RetryResult<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.run(operation, std::future::pending::<()>()).await
    }

    /// Run the operation, stopping as soon as `token` is cancelled
    ///
    /// Cancellation interrupts both an in-flight invocation and a backoff
    /// wait.
    pub async fn execute_with_cancellation<F, Fut, T>(
        &self,
        operation: F,
        token: &CancellationToken,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.execute_detailed_with_cancellation(operation, token)
            .await
            .into_result()
    }

    /// Like [`execute_with_cancellation`](Self::execute_with_cancellation),
    /// keeping attempt count and duration
    pub async fn execute_detailed_with_cancellation<F, Fut, T>(
        &self,
        operation: F,
        token: &CancellationToken,
    ) -> RetryResult<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.run(operation, token.cancelled()).await
    }

    /// Run the operation, stopping when `deadline` passes
    pub async fn execute_with_deadline<F, Fut, T>(
        &self,
        operation: F,
        deadline: Instant,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.run(operation, tokio::time::sleep_until(deadline))
            .await
            .into_result()
    }

    /// Run the operation and answer from `fallback` once retries are exhausted
    ///
    /// The fallback runs at most once, only for an exhausted budget, and is
    /// never retried. Non-retryable, ignored and cancelled outcomes are
    /// returned unchanged. The loop stops when the context's cancellation
    /// token fires.
    pub async fn execute_with_fallback<F, Fut, T, FB>(
        &self,
        ctx: &RequestContext,
        operation: F,
        fallback: FB,
    ) -> RetryResult<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        FB: FnOnce(&RequestContext, &Failure) -> T,
    {
        let mut outcome = self
            .execute_detailed_with_cancellation(operation, ctx.cancellation())
            .await;
        if let Err(RetryError::Exhausted { last, .. }) = &outcome.result {
            debug!(
                policy = %self.name(),
                request_id = %ctx.request_id(),
                attempts = outcome.attempts,
                failure = %last,
                "Retries exhausted, answering from fallback"
            );
            outcome.result = Ok(fallback(ctx, last));
            outcome.fallback_used = true;
        }
        outcome
    }

    async fn run<F, Fut, T, C>(&self, mut operation: F, cancel: C) -> RetryResult<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        C: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut cancel = pin!(cancel);
        let mut attempts = 0u32;

        let result = loop {
            if (&mut cancel).now_or_never().is_some() {
                break Err(self.cancelled(attempts, Duration::ZERO));
            }

            attempts += 1;
            let attempt_start = Instant::now();
            let result = tokio::select! {
                biased;
                () = &mut cancel => None,
                result = operation() => Some(result),
            };
            let elapsed = attempt_start.elapsed();

            let failure = match result {
                None => break Err(self.cancelled(attempts, elapsed)),
                Some(Ok(value)) => {
                    self.emit(&RetryEvent::success(
                        self.name(),
                        AttemptOutcome::succeeded(attempts, elapsed),
                    ));
                    break Ok(value);
                },
                Some(Err(failure)) => failure,
            };

            let wait = match self.on_failure(attempts, elapsed, failure) {
                Ok(wait) => wait,
                Err(err) => break Err(err),
            };

            let interrupted = tokio::select! {
                biased;
                () = &mut cancel => true,
                () = tokio::time::sleep(wait) => false,
            };
            if interrupted {
                break Err(self.cancelled(attempts, elapsed));
            }
        };

        RetryResult {
            result,
            attempts,
            total_duration: start.elapsed(),
            fallback_used: false,
        }
    }

    /// Classify a failure; `Ok` carries the wait before the next attempt
    fn on_failure(
        &self,
        attempts: u32,
        elapsed: Duration,
        failure: Failure,
    ) -> Result<Duration, RetryError> {
        let outcome = AttemptOutcome::failed(attempts, elapsed, failure.clone());

        if self.config.is_ignored(&failure) {
            debug!(policy = %self.name(), attempts, failure = %failure, "Failure ignored");
            self.emit(&RetryEvent::ignored(self.name(), outcome));
            return Err(RetryError::Ignored { attempts, failure });
        }

        if !self.config.is_retryable(&failure) {
            debug!(policy = %self.name(), attempts, failure = %failure, "Failure not retryable");
            self.emit(&RetryEvent::error(
                self.name(),
                outcome,
                ErrorReason::NonRetryable,
            ));
            return Err(RetryError::NonRetryable { attempts, failure });
        }

        if attempts >= self.config.max_attempts() {
            debug!(policy = %self.name(), attempts, failure = %failure, "Attempt budget used up");
            self.emit(&RetryEvent::error(self.name(), outcome, ErrorReason::Exhausted));
            return Err(RetryError::Exhausted {
                attempts,
                last: failure,
            });
        }

        let wait = self.config.backoff().delay(attempts);
        debug!(
            policy = %self.name(),
            attempts,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            failure = %failure,
            "Retrying after backoff"
        );
        self.emit(&RetryEvent::retry(self.name(), outcome, wait));
        Ok(wait)
    }

    fn cancelled(&self, attempts: u32, elapsed: Duration) -> RetryError {
        debug!(policy = %self.name(), attempts, "Retry loop cancelled");
        self.emit(&RetryEvent::error(
            self.name(),
            AttemptOutcome::failed(attempts, elapsed, Failure::cancelled()),
            ErrorReason::Cancelled,
        ));
        RetryError::Cancelled { attempts }
    }

    fn emit(&self, event: &RetryEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Run `operation` under `config`, reporting to `observers`
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    observers: &[Arc<dyn RetryObserverPort>],
    operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    RetryPolicy::new(config.clone())
        .with_observers(observers.iter().cloned())
        .execute(operation)
        .await
}
