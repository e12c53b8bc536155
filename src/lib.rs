//! # taskgate
//!
//! **Taskgate** is a concurrent, rate-limited, failure-resilient execution
//! harness for unreliable external calls.
//!
//! It runs batches of opaque tasks against a caller-supplied async call,
//! pacing them through a sliding-window rate limiter, guarding them with a
//! circuit breaker, retrying transient failures with exponential backoff,
//! and aggregating latency/error metrics into a final report. The crate is
//! designed as a building block for API clients, batch evaluators, and load
//! generators.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Task     │   │     Task     │   │     Task     │
//!     │ (id, payload)│   │ (id, payload)│   │ (id, payload)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (bounded worker pool)                                 │
//! │  - shared task queue (workers pull until empty or cancelled)      │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ RetryExecutor│   │ RetryExecutor│   │ RetryExecutor│
//!     │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │                  │                  │
//!      │   shared gates:  CircuitBreaker, SlidingWindowLimiter,
//!      │                  MetricsAggregator
//!      │
//!      │ Publishes        Events: CallStarting, CallFailed,
//!      ▼                  RetryScheduled, CircuitOpened, ...
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          SubscriberSet (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                       sub1.on   sub2.on   subN.on
//!                        _event()  _event()  _event()
//! ```
//!
//! ### Attempt lifecycle
//! ```text
//! Task ──► Dispatcher ──► worker ──► RetryExecutor::execute()
//!
//! loop {
//!   ├─► token cancelled?         ─► Canceled
//!   ├─► breaker open?            ─► CircuitOpen (call never invoked)
//!   ├─► limiter.admit()          (waits out the window, cancellable)
//!   ├─► invoke external call, timing it
//!   │       │
//!   │       ├─ Ok  ──► breaker.record_success ─► success
//!   │       │
//!   │       └─ Err ──► classify:
//!   │            ├─ Permanent            ─► stop immediately
//!   │            ├─ Transient/RateLimited, retries left:
//!   │            │    ├─ delay = backoff.delay(attempt)
//!   │            │    ├─ publish RetryScheduled{ delay, attempt }
//!   │            │    └─ sleep(delay) (cancellable), continue
//!   │            └─ retries exhausted    ─► ExhaustedRetries
//! }
//! ```
//!
//! ## Features
//! | Area               | Description                                                          | Key types / traits                          |
//! |--------------------|----------------------------------------------------------------------|---------------------------------------------|
//! | **Dispatch**       | Run task batches with bounded concurrency; collect a final report.   | [`Dispatcher`], [`Report`]                  |
//! | **Resilience**     | Retry with exponential backoff; trip open on failure streaks.        | [`RetryExecutor`], [`CircuitBreaker`]       |
//! | **Rate limiting**  | Pace admissions through a sliding time window.                       | [`SlidingWindowLimiter`]                    |
//! | **Classification** | Decide retryability from opaque call errors.                         | [`Classify`], [`SignatureClassifier`]       |
//! | **Policies**       | Configure backoff growth and jitter.                                 | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Metrics**        | Latency samples, hit/miss counters, percentiles, memory snapshots.   | [`MetricsAggregator`], [`MetricsSnapshot`]  |
//! | **Subscriber API** | Hook into run/call lifecycle events (logging, custom sinks).         | [`Subscribe`], [`Event`]                    |
//! | **Errors**         | Typed errors for configuration and task outcomes.                    | [`TaskError`], [`RuntimeError`]             |
//! | **Tasks**          | Define work as ids + opaque payloads, calls as async functions.      | [`Task`], [`CallFn`], [`CallRef`]           |
//! | **Configuration**  | Centralize harness settings, validated up front.                     | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{CallFn, CallRef, Config, Dispatcher, Task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         max_retries: 2,
//!         concurrency_limit: 4,
//!         ..Config::default()
//!     };
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = {
//!         use taskgate::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
//!
//!     let dispatcher = Dispatcher::new(cfg, subs)?;
//!
//!     // The external call: anything async that may fail.
//!     let call: CallRef = CallFn::arc(|task: Task| async move {
//!         if task.payload().is_empty() {
//!             return Err("empty payload".into());
//!         }
//!         Ok(())
//!     });
//!
//!     let tasks = vec![
//!         Task::new("req-1", "what is 2+2?").with_group("math"),
//!         Task::new("req-2", "capital of France?").with_group("trivia"),
//!     ];
//!
//!     let report = dispatcher.run(tasks, call, CancellationToken::new()).await;
//!     println!("{}/{} succeeded", report.succeeded, report.total_tasks);
//!     Ok(())
//! }
//! ```
mod calls;
mod config;
mod control;
mod error;
mod events;
mod exec;
mod metrics;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use calls::{Call, CallFn, CallRef, Classify, FailureKind, SignatureClassifier, Task};
pub use config::Config;
pub use control::{CircuitBreaker, SlidingWindowLimiter};
pub use error::{CallError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use exec::{Dispatcher, ErrorKindCounts, ExecutionResult, GroupStats, Report, RetryExecutor};
pub use metrics::{MetricsAggregator, MetricsSnapshot};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
