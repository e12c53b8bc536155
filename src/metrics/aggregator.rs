//! # Metrics aggregation for dispatch runs.
//!
//! [`MetricsAggregator`] collects per-outcome counters, a bounded FIFO buffer
//! of recent latencies, and occasional process-memory samples. It is written
//! to from every worker and read via [`MetricsAggregator::snapshot`].
//!
//! ## Bounding strategy
//! - Latencies: at most `max_samples` entries; the oldest is evicted first.
//! - Memory: sampled with probability `memory_sample_rate` per outcome (a
//!   uniform draw), keeping sampling overhead off the hot path.
//!
//! ## Percentiles
//! Computed on demand from a sorted copy of the current buffer, indexing at
//! `ceil(q * n) - 1` clamped to the valid range.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;

use crate::metrics::memory;

#[derive(Debug)]
struct Inner {
    total: u64,
    hits: u64,
    misses: u64,
    rate_limit_hits: u64,
    retries: u64,
    latencies: VecDeque<Duration>,
    error_kinds: HashMap<&'static str, u64>,
    memory_samples: u64,
    last_memory_kb: Option<u64>,
}

impl Inner {
    fn empty() -> Self {
        Self {
            total: 0,
            hits: 0,
            misses: 0,
            rate_limit_hits: 0,
            retries: 0,
            latencies: VecDeque::new(),
            error_kinds: HashMap::new(),
            memory_samples: 0,
            last_memory_kb: None,
        }
    }
}

/// Thread-safe counters, bounded latency history, and memory sampling.
///
/// All mutating operations take a single lock; no lock is held across an
/// `.await` (the API is fully synchronous).
pub struct MetricsAggregator {
    max_samples: usize,
    memory_sample_rate: f64,
    inner: Mutex<Inner>,
}

impl MetricsAggregator {
    /// Creates an aggregator keeping at most `max_samples` latencies and
    /// sampling memory with probability `memory_sample_rate` per outcome.
    pub fn new(max_samples: usize, memory_sample_rate: f64) -> Self {
        Self {
            max_samples: max_samples.max(1),
            memory_sample_rate: memory_sample_rate.clamp(0.0, 1.0),
            inner: Mutex::new(Inner::empty()),
        }
    }

    /// Records one attempt outcome.
    ///
    /// Invariant: after any number of interleaved calls,
    /// `hits + misses == total`.
    pub fn record_outcome(&self, duration: Duration, success: bool) {
        let sample_memory =
            self.memory_sample_rate > 0.0 && rand::rng().random::<f64>() < self.memory_sample_rate;
        let memory_kb = if sample_memory {
            memory::resident_kb()
        } else {
            None
        };

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.total += 1;
        if success {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }

        inner.latencies.push_back(duration);
        while inner.latencies.len() > self.max_samples {
            inner.latencies.pop_front();
        }

        if let Some(kb) = memory_kb {
            inner.memory_samples += 1;
            inner.last_memory_kb = Some(kb);
        }
    }

    /// Counts one rate-limited failure (classified from the call's error).
    pub fn record_rate_limit_hit(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .rate_limit_hits += 1;
    }

    /// Counts one scheduled retry.
    pub fn record_retry(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).retries += 1;
    }

    /// Counts one final error by its stable label.
    pub fn record_error(&self, label: &'static str) {
        *self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .error_kinds
            .entry(label)
            .or_insert(0) += 1;
    }

    /// Returns an internally consistent copy of the current state.
    ///
    /// The copy is taken under the same lock the writers use, so it never
    /// observes a torn update; it may be stale relative to concurrent writers.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let mut sorted: Vec<Duration> = inner.latencies.iter().copied().collect();
        sorted.sort_unstable();

        let avg_latency = if sorted.is_empty() {
            None
        } else {
            let sum: Duration = sorted.iter().sum();
            Some(sum / sorted.len() as u32)
        };

        MetricsSnapshot {
            total_requests: inner.total,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if inner.total == 0 {
                0.0
            } else {
                inner.hits as f64 / inner.total as f64
            },
            avg_latency,
            p90_latency: percentile(&sorted, 0.90),
            rate_limit_hits: inner.rate_limit_hits,
            retries: inner.retries,
            error_kinds: inner.error_kinds.clone(),
            latency_sample_count: sorted.len(),
            memory_sample_count: inner.memory_samples,
            last_memory_kb: inner.last_memory_kb,
        }
    }

    /// Clears all counters, latencies, and samples.
    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Inner::empty();
    }
}

/// Indexes a **sorted** sample set at `ceil(q * n) - 1`, clamped.
fn percentile(sorted: &[Duration], q: f64) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[idx])
}

/// Derived, read-only view of the aggregator at one point in time.
#[derive(Clone, Debug)]
pub struct MetricsSnapshot {
    /// Total recorded outcomes (`hits + misses`).
    pub total_requests: u64,
    /// Successful outcomes.
    pub hits: u64,
    /// Failed outcomes.
    pub misses: u64,
    /// `hits / total_requests`, `0.0` when nothing was recorded.
    pub hit_rate: f64,
    /// Mean of the retained latency samples.
    pub avg_latency: Option<Duration>,
    /// 90th-percentile of the retained latency samples.
    pub p90_latency: Option<Duration>,
    /// Failures classified as rate-limited.
    pub rate_limit_hits: u64,
    /// Scheduled retries.
    pub retries: u64,
    /// Final error counts by stable label.
    pub error_kinds: HashMap<&'static str, u64>,
    /// Latency samples currently retained (≤ `max_samples`).
    pub latency_sample_count: usize,
    /// Memory samples taken so far.
    pub memory_sample_count: u64,
    /// Most recent resident set size sample, in KiB.
    pub last_memory_kb: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_hits_plus_misses_equals_total_under_concurrency() {
        let agg = Arc::new(MetricsAggregator::new(100, 0.0));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let agg = Arc::clone(&agg);
                scope.spawn(move || {
                    for i in 0..1_250u64 {
                        let success = (i + worker) % 3 != 0;
                        agg.record_outcome(Duration::from_millis(1), success);
                    }
                });
            }
        });

        let snap = agg.snapshot();
        assert_eq!(snap.total_requests, 10_000);
        assert_eq!(snap.hits + snap.misses, snap.total_requests);
    }

    #[test]
    fn test_latency_buffer_evicts_fifo() {
        let agg = MetricsAggregator::new(5, 0.0);
        // Push 8 known values; the oldest 3 (1..=3ms) must be evicted.
        for ms in 1..=8u64 {
            agg.record_outcome(Duration::from_millis(ms), true);
        }

        let snap = agg.snapshot();
        assert_eq!(snap.latency_sample_count, 5);
        // Retained samples are 4..=8ms → mean 6ms, p90 = 8ms.
        assert_eq!(snap.avg_latency, Some(Duration::from_millis(6)));
        assert_eq!(snap.p90_latency, Some(Duration::from_millis(8)));
    }

    #[test]
    fn test_percentile_indexing() {
        let samples: Vec<Duration> = (1..=10).map(Duration::from_millis).collect();
        // ceil(0.9 * 10) - 1 = 8 → 9ms.
        assert_eq!(percentile(&samples, 0.90), Some(Duration::from_millis(9)));
        assert_eq!(percentile(&samples, 0.50), Some(Duration::from_millis(5)));
        assert_eq!(percentile(&samples[..1], 0.90), Some(Duration::from_millis(1)));
        assert_eq!(percentile(&[], 0.90), None);
    }

    #[test]
    fn test_error_and_rate_limit_counters() {
        let agg = MetricsAggregator::new(10, 0.0);
        agg.record_error("transient");
        agg.record_error("transient");
        agg.record_error("permanent");
        agg.record_rate_limit_hit();
        agg.record_retry();

        let snap = agg.snapshot();
        assert_eq!(snap.error_kinds.get("transient"), Some(&2));
        assert_eq!(snap.error_kinds.get("permanent"), Some(&1));
        assert_eq!(snap.rate_limit_hits, 1);
        assert_eq!(snap.retries, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let agg = MetricsAggregator::new(10, 0.0);
        agg.record_outcome(Duration::from_millis(5), true);
        agg.record_error("permanent");
        agg.reset();

        let snap = agg.snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.hit_rate, 0.0);
        assert!(snap.avg_latency.is_none());
        assert!(snap.error_kinds.is_empty());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_memory_sampled_at_full_rate() {
        let agg = MetricsAggregator::new(10, 1.0);
        agg.record_outcome(Duration::from_millis(1), true);

        let snap = agg.snapshot();
        assert_eq!(snap.memory_sample_count, 1);
        assert!(snap.last_memory_kb.unwrap() > 0);
    }
}
