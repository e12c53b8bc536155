//! # Dispatcher: bounded worker pool over a shared task queue.
//!
//! The [`Dispatcher`] owns the shared state of a run — one limiter, one
//! breaker, one metrics aggregator, one event bus — and is the only component
//! that spawns workers. Everything else is passive and lock-protected.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<Task>, CallRef, CancellationToken
//!
//! Preparation:
//!   - subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   - shared queue = Mutex<VecDeque<Task>>
//!
//! Spawn workers (min(concurrency_limit, tasks)):
//!   worker 1..N: loop {
//!       pull next unclaimed task from queue
//!       RetryExecutor::execute(task, call, token)
//!       send ExecutionResult over mpsc (completion order)
//!   }
//!
//! Collection:
//!   JoinSet drains workers → results channel drained → Report::build()
//!
//! Cancellation path:
//!   token fires → workers stop pulling; in-flight attempts stop at the next
//!   retry-loop boundary; unstarted tasks are drained into Canceled results
//!   so the report still carries one entry per submitted task.
//! ```
//!
//! ## Load-test mode
//! [`Dispatcher::load_test`] submits `n` synthetic identical tasks through
//! the same executor/metrics stack to characterize the effective throughput
//! ceiling under the configured limiter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::calls::{CallRef, Classify, SignatureClassifier, Task};
use crate::config::Config;
use crate::control::{CircuitBreaker, SlidingWindowLimiter};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::exec::executor::RetryExecutor;
use crate::exec::report::Report;
use crate::exec::result::ExecutionResult;
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Coordinates workers, shared gates, metrics, and event delivery for a run.
///
/// Construct one per batch (or reuse across batches to share breaker/limiter
/// history); all state is explicit and process-local — there is no implicit
/// global instance.
pub struct Dispatcher {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    limiter: Arc<SlidingWindowLimiter>,
    breaker: Arc<CircuitBreaker>,
    metrics: Arc<MetricsAggregator>,
    classifier: Arc<dyn Classify>,
    listener_started: AtomicBool,
}

impl Dispatcher {
    /// Creates a dispatcher from a validated config and the provided
    /// subscribers.
    ///
    /// Fails with [`RuntimeError::InvalidConfig`] if any constraint of
    /// [`Config::validate`] is violated; a run can therefore never start
    /// misconfigured.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Result<Self, RuntimeError> {
        cfg.validate()?;

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        let limiter = Arc::new(SlidingWindowLimiter::new(
            cfg.rate_limit_window,
            cfg.max_requests_per_window,
        ));
        let breaker = Arc::new(CircuitBreaker::new(
            cfg.failure_threshold,
            cfg.cooldown_duration,
        ));
        let metrics = Arc::new(MetricsAggregator::new(
            cfg.max_samples,
            cfg.memory_sample_rate,
        ));

        Ok(Self {
            cfg,
            bus,
            subs,
            limiter,
            breaker,
            metrics,
            classifier: Arc::new(SignatureClassifier),
            listener_started: AtomicBool::new(false),
        })
    }

    /// Replaces the default [`SignatureClassifier`] with a caller-supplied
    /// classifier (e.g. one backed by typed errors).
    pub fn with_classifier(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Shared metrics aggregator (live view; survives across runs).
    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.metrics)
    }

    /// Convenience: current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Event bus handle, for callers that want their own receivers.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// Runs all `tasks` through the retry executor with bounded concurrency
    /// and returns the aggregate [`Report`].
    ///
    /// - Results arrive in completion order; correlate via task id.
    /// - One task's failure never aborts the batch.
    /// - On cancellation, unstarted tasks are reported as `Canceled` with
    ///   zero attempts; completed results are kept.
    pub async fn run(&self, tasks: Vec<Task>, call: CallRef, token: CancellationToken) -> Report {
        let submitted = tasks.len();
        self.subscriber_listener();
        self.bus.publish(
            Event::new(EventKind::RunStarted).with_attempt(submitted.min(u32::MAX as usize) as u32),
        );

        let queue = Arc::new(Mutex::new(tasks.into_iter().collect::<VecDeque<Task>>()));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ExecutionResult>();
        let executor = Arc::new(RetryExecutor::new(
            &self.cfg,
            Arc::clone(&self.limiter),
            Arc::clone(&self.breaker),
            Arc::clone(&self.metrics),
            Arc::clone(&self.classifier),
            self.bus.clone(),
        ));

        let workers = self.cfg.concurrency_limit.min(submitted.max(1));
        let mut set = JoinSet::new();
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let executor = Arc::clone(&executor);
            let call = Arc::clone(&call);
            let token = token.clone();
            let result_tx = result_tx.clone();

            set.spawn(async move {
                loop {
                    if token.is_cancelled() {
                        break;
                    }
                    let Some(task) = queue.lock().await.pop_front() else {
                        break;
                    };
                    let result = executor.execute(&task, call.as_ref(), &token).await;
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        while set.join_next().await.is_some() {}

        let mut results = Vec::with_capacity(submitted);
        while let Ok(result) = result_rx.try_recv() {
            results.push(result);
        }

        if token.is_cancelled() {
            // Drain tasks the workers never claimed so the report still has
            // one entry per submitted task.
            let mut queue = queue.lock().await;
            while let Some(task) = queue.pop_front() {
                self.metrics.record_error(TaskError::Canceled.as_label());
                results.push(ExecutionResult::failed(
                    &task,
                    0,
                    std::time::Duration::ZERO,
                    TaskError::Canceled,
                ));
            }
            self.bus.publish(Event::new(EventKind::RunCancelled));
        }

        self.bus.publish(Event::new(EventKind::RunFinished));
        Report::build(results, self.metrics.snapshot())
    }

    /// Load-test mode: submits `n` identical synthetic tasks as fast as the
    /// limiter allows, reusing the same executor/metrics stack.
    pub async fn load_test(&self, n: usize, call: CallRef, token: CancellationToken) -> Report {
        let tasks = (0..n)
            .map(|i| Task::new(format!("load-{i}"), "").with_group("load-test"))
            .collect();
        self.run(tasks, call, token).await
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    /// Spawned at most once per dispatcher, lazily on the first run.
    fn subscriber_listener(&self) {
        if self.subs.is_empty() || self.listener_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }
}
