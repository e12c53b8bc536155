//! # Sliding-window admission limiter.
//!
//! [`SlidingWindowLimiter`] bounds the number of admissions inside any
//! trailing time window. It is a *local estimate* of the downstream's rate
//! limit, not a guarantee of compliance with the real one.
//!
//! ## Algorithm
//! Under a single lock:
//! 1. prune timestamps older than `now - window` (lazy, on every check);
//! 2. if fewer than `max_requests` remain, record `now` and admit;
//! 3. otherwise compute `wait = window - (now - oldest)`, release the lock,
//!    sleep that long (clamped to ≥ 0), and re-check.
//!
//! Under heavy contention the wait estimate can be stale by the time the
//! caller re-acquires the lock; the loop simply re-checks. This is an
//! acceptable approximation, not hard real-time pacing.
//!
//! ## Invariant
//! At most `max_requests` admissions are recorded within `window` of any
//! read, and every retained timestamp is within `window` of "now".

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Local admission control over a trailing time window.
///
/// Shared by all workers via `Arc`; the internal lock serializes
/// prune-and-append so no two callers can admit past the cap.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter allowing `max_requests` admissions per `window`.
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            admitted: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Blocks until an admission slot is free in the trailing window.
    ///
    /// Returns [`TaskError::Canceled`] if `token` fires while waiting; an
    /// already-granted admission is never revoked.
    pub async fn admit(&self, token: &CancellationToken) -> Result<(), TaskError> {
        loop {
            let wait = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = admitted.front() {
                    if now.duration_since(oldest) >= self.window {
                        admitted.pop_front();
                    } else {
                        break;
                    }
                }

                if admitted.len() < self.max_requests {
                    admitted.push_back(now);
                    return Ok(());
                }

                match admitted.front() {
                    Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };

            let sleep = time::sleep(wait);
            tokio::pin!(sleep);
            tokio::select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => return Err(TaskError::Canceled),
            }
        }
    }

    /// Number of admissions currently inside the window (prunes first).
    pub async fn in_flight(&self) -> usize {
        let mut admitted = self.admitted.lock().await;
        let now = Instant::now();
        while let Some(&oldest) = admitted.front() {
            if now.duration_since(oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }
        admitted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_up_to_cap_never_blocks() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 5);
        let token = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..5 {
            limiter.admit(&token).await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_flight().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_admission_waits_full_window() {
        // Scenario: window=60s, cap=5. Five instant admissions at t=0; the
        // sixth must not return before t≈60s.
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 5);
        let token = CancellationToken::new();

        for _ in 0..5 {
            limiter.admit(&token).await.unwrap();
        }

        let start = Instant::now();
        limiter.admit(&token).await.unwrap();
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(60), "waited {waited:?}");
        assert!(waited <= Duration::from_secs(61), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_pruned() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(10), 2);
        let token = CancellationToken::new();

        limiter.admit(&token).await.unwrap();
        limiter.admit(&token).await.unwrap();
        time::advance(Duration::from_secs(11)).await;

        assert_eq!(limiter.in_flight().await, 0);
        let start = Instant::now();
        limiter.admit(&token).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_returns_canceled() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        let token = CancellationToken::new();

        limiter.admit(&token).await.unwrap();
        token.cancel();

        let res = limiter.admit(&token).await;
        assert!(matches!(res, Err(TaskError::Canceled)));
    }
}
