//! # Two-state circuit breaker.
//!
//! Fails fast once the downstream looks unhealthy, so workers stop burning
//! retry budget (and rate-limit slots) on a dead service.
//!
//! ## States
//! - **Closed**: requests pass through.
//! - **Open**: requests are rejected without invoking the downstream.
//!
//! ## Transitions
//! ```text
//! Closed → Open:   consecutive_failures >= threshold after a failed attempt
//! Open   → Closed: now - opened_at >= cooldown, observed lazily by the
//!                  next allow() call (no background timer)
//! ```
//!
//! Any success while Closed resets the consecutive-failure counter. Closing
//! after cooldown also resets it, otherwise a single failure would re-trip
//! the breaker immediately.
//!
//! There is deliberately no half-open probe state: after cooldown the breaker
//! re-admits all traffic at once, matching the original design.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Breaker state plus the consecutive-failure counter, guarded together.
#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open { since: Instant },
}

#[derive(Debug)]
struct Inner {
    state: State,
    consecutive_failures: u32,
}

/// Failure-triggered fail-fast gate shared by all workers.
///
/// `allow()` / `record_success()` / `record_failure()` are synchronous and
/// take a single short-lived lock; the lock is never held across an `.await`.
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Creates a closed breaker that trips after `failure_threshold`
    /// consecutive failures and re-admits traffic after `cooldown`.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
            }),
        }
    }

    /// Returns whether a call may proceed.
    ///
    /// `false` means fail fast without invoking the downstream. An open
    /// breaker whose cooldown has elapsed transitions back to closed here,
    /// on the observing caller's clock tick.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            State::Closed => true,
            State::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    inner.state = State::Closed;
                    inner.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful attempt; resets the failure streak while closed.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(inner.state, State::Closed) {
            inner.consecutive_failures = 0;
        }
    }

    /// Records a failed attempt.
    ///
    /// Returns `true` if this failure tripped the breaker open, so the caller
    /// can publish a transition event exactly once.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if matches!(inner.state, State::Closed)
            && inner.consecutive_failures >= self.failure_threshold
        {
            inner.state = State::Open {
                since: Instant::now(),
            };
            return true;
        }
        false
    }

    /// Current consecutive-failure count (for diagnostics).
    pub fn consecutive_failures(&self) -> u32 {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .consecutive_failures
    }

    /// True if the breaker is currently open (without triggering the lazy
    /// cooldown transition).
    pub fn is_open(&self) -> bool {
        matches!(
            self.inner.lock().unwrap_or_else(|e| e.into_inner()).state,
            State::Open { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn test_trips_after_threshold_failures() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(300));

        for i in 0..4 {
            assert!(!breaker.record_failure(), "failure {} must not trip", i);
            assert!(breaker.allow());
        }
        assert!(breaker.record_failure(), "fifth failure must trip");
        assert!(!breaker.allow());
        assert!(breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closes_only_after_cooldown() {
        // Scenario: threshold=5, cooldown=300s.
        let breaker = CircuitBreaker::new(5, Duration::from_secs(300));
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(!breaker.allow());

        time::advance(Duration::from_secs(299)).await;
        assert!(!breaker.allow(), "still cooling down");

        time::advance(Duration::from_secs(2)).await;
        assert!(breaker.allow(), "cooldown elapsed, lazily closed");
        assert!(!breaker.is_open());
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_streak_while_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(10));

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.consecutive_failures(), 0);

        // The streak restarts from zero after the success.
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.allow());
        assert!(breaker.record_failure());
        assert!(!breaker.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trip_reported_exactly_once() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(10));
        assert!(!breaker.record_failure());
        assert!(breaker.record_failure());
        // Further failures while open do not report a new transition.
        assert!(!breaker.record_failure());
    }
}
