//! # RetryExecutor: runs one task to completion-or-exhaustion.
//!
//! Composes the circuit breaker, the sliding-window limiter, the backoff
//! policy, and the metrics aggregator around the opaque external call.
//!
//! ## Attempt loop
//! ```text
//! loop (attempt = 0..=max_retries) {
//!   ├─► token cancelled?          → finalize Canceled
//!   ├─► breaker.allow() == false  → finalize CircuitOpen (call NOT invoked,
//!   │                               attempt NOT counted)
//!   ├─► limiter.admit()           (may block up to the window; cancellable)
//!   ├─► publish CallStarting
//!   ├─► invoke call, time it
//!   ├─► Ok  ──► breaker.record_success, metrics hit  → finalize success
//!   └─► Err ──► classify, breaker.record_failure, metrics miss
//!         ├─► permanent           → finalize Permanent
//!         ├─► attempts left       → publish RetryScheduled,
//!         │                         sleep backoff.delay(attempt) (cancellable)
//!         └─► retries exhausted   → finalize ExhaustedRetries
//! }
//! ```
//!
//! ## Guarantees
//! - The call is invoked at most `max_retries + 1` times per task, and zero
//!   times if the breaker denies the first check.
//! - Cancellation is observed only at loop boundaries (before an attempt,
//!   inside the admission wait, inside the backoff sleep) — never mid-call.
//! - No lock is held across the call or any sleep.

use std::sync::Arc;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::calls::{Call, Classify, FailureKind, Task};
use crate::config::Config;
use crate::control::{CircuitBreaker, SlidingWindowLimiter};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::exec::result::ExecutionResult;
use crate::metrics::MetricsAggregator;
use crate::policies::BackoffPolicy;

/// Runs single tasks through the breaker/limiter/backoff stack.
///
/// Cheap to share: every field is either `Copy` or an `Arc` onto state owned
/// by the dispatcher.
pub struct RetryExecutor {
    max_retries: u32,
    backoff: BackoffPolicy,
    limiter: Arc<SlidingWindowLimiter>,
    breaker: Arc<CircuitBreaker>,
    metrics: Arc<MetricsAggregator>,
    classifier: Arc<dyn Classify>,
    bus: Bus,
}

impl RetryExecutor {
    /// Wires an executor over the run's shared components.
    pub fn new(
        cfg: &Config,
        limiter: Arc<SlidingWindowLimiter>,
        breaker: Arc<CircuitBreaker>,
        metrics: Arc<MetricsAggregator>,
        classifier: Arc<dyn Classify>,
        bus: Bus,
    ) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff: cfg.backoff(),
            limiter,
            breaker,
            metrics,
            classifier,
            bus,
        }
    }

    /// Executes `task` until success, exhaustion, breaker rejection, or
    /// cancellation. Never returns an error: every failure mode is captured
    /// into the [`ExecutionResult`].
    pub async fn execute(
        &self,
        task: &Task,
        call: &dyn Call,
        token: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                return self.finalize_failure(task, attempt, started, TaskError::Canceled);
            }

            if !self.breaker.allow() {
                self.bus.publish(
                    Event::new(EventKind::CircuitRejected).with_task(task.id_arc()),
                );
                // Rejection is not an attempt: the call was never invoked.
                return self.finalize_failure(task, attempt, started, TaskError::CircuitOpen);
            }

            if self.limiter.admit(token).await.is_err() {
                return self.finalize_failure(task, attempt, started, TaskError::Canceled);
            }

            let attempt_no = attempt + 1;
            self.bus.publish(
                Event::new(EventKind::CallStarting)
                    .with_task(task.id_arc())
                    .with_attempt(attempt_no),
            );

            let attempt_started = Instant::now();
            let outcome = call.invoke(task).await;
            let duration = attempt_started.elapsed();

            match outcome {
                Ok(()) => {
                    self.breaker.record_success();
                    self.metrics.record_outcome(duration, true);
                    self.bus.publish(
                        Event::new(EventKind::CallSucceeded)
                            .with_task(task.id_arc())
                            .with_attempt(attempt_no),
                    );
                    return ExecutionResult::succeeded(task, attempt_no, started.elapsed());
                }
                Err(err) => {
                    let kind = self.classifier.classify(&err);
                    let message = err.to_string();

                    if kind == FailureKind::RateLimited {
                        self.metrics.record_rate_limit_hit();
                    }
                    let tripped = self.breaker.record_failure();
                    self.metrics.record_outcome(duration, false);

                    self.bus.publish(
                        Event::new(EventKind::CallFailed)
                            .with_task(task.id_arc())
                            .with_attempt(attempt_no)
                            .with_reason(message.clone()),
                    );
                    if tripped {
                        self.bus
                            .publish(Event::new(EventKind::CircuitOpened).with_task(task.id_arc()));
                    }

                    let error = kind.into_task_error(message.clone());
                    if !error.is_retryable() {
                        return self.finalize_failure(task, attempt_no, started, error);
                    }

                    if attempt >= self.max_retries {
                        return self.finalize_failure(
                            task,
                            attempt_no,
                            started,
                            TaskError::ExhaustedRetries {
                                attempts: attempt_no,
                                last: message,
                            },
                        );
                    }

                    let delay = self.backoff.delay(attempt);
                    self.metrics.record_retry();
                    self.bus.publish(
                        Event::new(EventKind::RetryScheduled)
                            .with_task(task.id_arc())
                            .with_attempt(attempt_no)
                            .with_delay(delay)
                            .with_reason(message),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    tokio::select! {
                        _ = &mut sleep => {}
                        _ = token.cancelled() => {
                            return self.finalize_failure(
                                task,
                                attempt_no,
                                started,
                                TaskError::Canceled,
                            );
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn finalize_failure(
        &self,
        task: &Task,
        attempts: u32,
        started: Instant,
        error: TaskError,
    ) -> ExecutionResult {
        self.metrics.record_error(error.as_label());
        ExecutionResult::failed(task, attempts, started.elapsed(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::{CallFn, CallRef, SignatureClassifier};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn executor(cfg: &Config) -> RetryExecutor {
        RetryExecutor::new(
            cfg,
            Arc::new(SlidingWindowLimiter::new(
                cfg.rate_limit_window,
                cfg.max_requests_per_window,
            )),
            Arc::new(CircuitBreaker::new(
                cfg.failure_threshold,
                cfg.cooldown_duration,
            )),
            Arc::new(MetricsAggregator::new(cfg.max_samples, 0.0)),
            Arc::new(SignatureClassifier),
            Bus::new(cfg.bus_capacity_clamped()),
        )
    }

    fn failing_call(counter: Arc<AtomicUsize>, message: &'static str) -> CallRef {
        CallFn::arc(move |_task: Task| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(message.into())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_retries() {
        // Scenario: max_retries=3, call always fails transiently
        // → attempts == 4, success == false.
        let cfg = Config {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            ..Config::default()
        };
        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "request timed out");

        let exec = executor(&cfg);
        let task = Task::new("t1", "payload");
        let result = exec.execute(&task, call.as_ref(), &CancellationToken::new()).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 4);
        assert_eq!(invocations.load(Ordering::SeqCst), 4);
        assert!(matches!(
            result.error,
            Some(TaskError::ExhaustedRetries { attempts: 4, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_stops_immediately() {
        let cfg = Config {
            max_retries: 5,
            ..Config::default()
        };
        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "invalid api key");

        let exec = executor(&cfg);
        let task = Task::new("t1", "payload");
        let result = exec.execute(&task, call.as_ref(), &CancellationToken::new()).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 1);
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(matches!(result.error, Some(TaskError::Permanent { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_rejects_without_invoking() {
        let cfg = Config {
            failure_threshold: 5,
            ..Config::default()
        };
        let exec = executor(&cfg);
        for _ in 0..5 {
            exec.breaker.record_failure();
        }

        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "never reached");
        let task = Task::new("t1", "payload");
        let result = exec.execute(&task, call.as_ref(), &CancellationToken::new()).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 0, "rejection is not an attempt");
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        assert!(matches!(result.error, Some(TaskError::CircuitOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_cooldown_readmits_calls() {
        // Scenario: threshold=5, cooldown=300s. Five transient failures trip
        // the breaker; the next call is rejected without dispatch; after 301s
        // the call is invoked again.
        let cfg = Config {
            max_retries: 0,
            failure_threshold: 5,
            cooldown_duration: Duration::from_secs(300),
            max_requests_per_window: 100,
            ..Config::default()
        };
        let exec = executor(&cfg);
        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "connection reset");
        let token = CancellationToken::new();

        for i in 0..5 {
            let task = Task::new(format!("t{i}"), "");
            let result = exec.execute(&task, call.as_ref(), &token).await;
            assert!(!result.success);
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 5);

        let rejected = exec
            .execute(&Task::new("t5", ""), call.as_ref(), &token)
            .await;
        assert!(matches!(rejected.error, Some(TaskError::CircuitOpen)));
        assert_eq!(invocations.load(Ordering::SeqCst), 5, "call not invoked");

        time::advance(Duration::from_secs(301)).await;
        let after = exec
            .execute(&Task::new("t6", ""), call.as_ref(), &token)
            .await;
        assert_eq!(invocations.load(Ordering::SeqCst), 6, "call invoked again");
        assert!(matches!(after.error, Some(TaskError::ExhaustedRetries { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let cfg = Config {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            ..Config::default()
        };
        let invocations = Arc::new(AtomicUsize::new(0));
        let call: CallRef = {
            let invocations = Arc::clone(&invocations);
            CallFn::arc(move |_task: Task| {
                let invocations = Arc::clone(&invocations);
                async move {
                    if invocations.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("503 service unavailable".into())
                    } else {
                        Ok(())
                    }
                }
            })
        };

        let exec = executor(&cfg);
        let result = exec
            .execute(&Task::new("t1", ""), call.as_ref(), &CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.attempts, 3);
        assert!(result.error.is_none());

        let snap = exec.metrics.snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 2);
        assert_eq!(snap.retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_failures_counted() {
        let cfg = Config {
            max_retries: 1,
            ..Config::default()
        };
        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "HTTP 429 too many requests");

        let exec = executor(&cfg);
        let _ = exec
            .execute(&Task::new("t1", ""), call.as_ref(), &CancellationToken::new())
            .await;

        let snap = exec.metrics.snapshot();
        assert_eq!(snap.rate_limit_hits, 2);
        assert_eq!(snap.misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_backoff() {
        let cfg = Config {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
            ..Config::default()
        };
        let invocations = Arc::new(AtomicUsize::new(0));
        let call = failing_call(Arc::clone(&invocations), "timeout");
        let token = CancellationToken::new();

        let exec = executor(&cfg);
        let task = Task::new("t1", "");
        let handle = {
            let token = token.clone();
            async move {
                // Cancel while the executor sleeps out its first backoff.
                time::sleep(Duration::from_secs(1)).await;
                token.cancel();
            }
        };
        let (result, ()) = tokio::join!(exec.execute(&task, call.as_ref(), &token), handle);

        assert!(!result.success);
        assert_eq!(invocations.load(Ordering::SeqCst), 1, "no attempt after cancel");
        assert!(matches!(result.error, Some(TaskError::Canceled)));
    }
}
