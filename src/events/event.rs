//! # Runtime events emitted by the dispatcher and retry executor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: batch lifecycle (started, finished, cancelled)
//! - **Call events**: per-attempt flow (starting, succeeded, failed, retry,
//!   circuit transitions)
//! - **Subscriber events**: fan-out faults (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name, group, attempt numbers, and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CallFailed)
//!     .with_task("req-7")
//!     .with_reason("429 too many requests")
//!     .with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::CallFailed);
//! assert_eq!(ev.task.as_deref(), Some("req-7"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run lifecycle events ===
    /// A dispatch run started.
    ///
    /// Sets:
    /// - `attempt`: number of submitted tasks
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RunStarted,

    /// All tasks of the run completed (successfully or not).
    RunFinished,

    /// The run's cancellation token fired; pending tasks will not start.
    RunCancelled,

    // === Call lifecycle events ===
    /// A worker is starting an attempt for a task.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: attempt number (1-based)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CallStarting,

    /// An attempt succeeded.
    ///
    /// Sets: `task`, `attempt`, `at`, `seq`.
    CallSucceeded,

    /// An attempt failed (error text in `reason`).
    ///
    /// Sets: `task`, `attempt`, `reason`, `at`, `seq`.
    CallFailed,

    /// A retry was scheduled after a transient failure.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `attempt`: the failed attempt number
    /// - `delay_ms`: backoff delay before the next attempt
    /// - `reason`: last failure message
    RetryScheduled,

    /// The circuit breaker tripped open after consecutive failures.
    ///
    /// Sets: `task` (the task whose failure tripped it), `at`, `seq`.
    CircuitOpened,

    /// A task was rejected without dispatch because the breaker was open.
    ///
    /// Sets: `task`, `at`, `seq`.
    CircuitRejected,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`, `at`, `seq`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic info), `at`, `seq`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task id, or subscriber name for subscriber events.
    pub task: Option<Arc<str>>,
    /// Task group label, if the task carries one.
    pub group: Option<Arc<str>>,
    /// Attempt count (starting from 1), or task count for `RunStarted`.
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            group: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task id (or subscriber name).
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a group label.
    #[inline]
    pub fn with_group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
