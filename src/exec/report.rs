//! # Aggregate report for a dispatch run.
//!
//! Built once by the dispatcher after all workers finish. Consumed by
//! external reporting collaborators; this crate owns no persistence or wire
//! format for it.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::TaskError;
use crate::exec::result::ExecutionResult;
use crate::metrics::MetricsSnapshot;

/// Success statistics for one task group.
#[derive(Clone, Debug, Default)]
pub struct GroupStats {
    /// Tasks submitted under this group.
    pub total: usize,
    /// Tasks that eventually succeeded.
    pub succeeded: usize,
    /// `succeeded / total`.
    pub success_rate: f64,
}

/// Final error counts by kind.
///
/// Every kind is always present, even when zero, so consumers can rely on
/// the full shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorKindCounts {
    /// Transient failures surfaced as final errors (retry not attempted).
    pub transient: u64,
    /// Permanent (non-retryable) failures.
    pub permanent: u64,
    /// Tasks rejected by the open circuit breaker.
    pub circuit_open: u64,
    /// Tasks that spent all retries on transient failures.
    pub exhausted_retries: u64,
    /// Tasks cancelled before completion.
    pub canceled: u64,
}

impl ErrorKindCounts {
    fn count(&mut self, error: &TaskError) {
        match error {
            TaskError::Transient { .. } => self.transient += 1,
            TaskError::Permanent { .. } => self.permanent += 1,
            TaskError::CircuitOpen => self.circuit_open += 1,
            TaskError::ExhaustedRetries { .. } => self.exhausted_retries += 1,
            TaskError::Canceled => self.canceled += 1,
        }
    }

    /// Sum over all kinds.
    pub fn total(&self) -> u64 {
        self.transient + self.permanent + self.circuit_open + self.exhausted_retries + self.canceled
    }
}

/// Aggregate outcome of one dispatch run.
///
/// Contains exactly one [`ExecutionResult`] per submitted task (in completion
/// order), overall and per-group success rates, latency statistics, and the
/// metrics snapshot the statistics were derived from.
#[derive(Debug)]
pub struct Report {
    /// One entry per submitted task, completion order.
    pub results: Vec<ExecutionResult>,
    /// Number of submitted tasks.
    pub total_tasks: usize,
    /// Number of tasks that eventually succeeded.
    pub succeeded: usize,
    /// `succeeded / total_tasks`, `0.0` for an empty run.
    pub success_rate: f64,
    /// Per-group success statistics (tasks without a group are only counted
    /// in the overall numbers).
    pub group_stats: HashMap<String, GroupStats>,
    /// Mean attempt latency over the retained samples.
    pub avg_latency: Option<Duration>,
    /// 90th-percentile attempt latency over the retained samples.
    pub p90_latency: Option<Duration>,
    /// Failures classified as rate-limited across all attempts.
    pub rate_limit_hits: u64,
    /// Retries scheduled across all tasks.
    pub retries: u64,
    /// Final error counts by kind (all kinds present even when zero).
    pub error_kinds: ErrorKindCounts,
    /// The metrics snapshot the latency/rate figures were taken from.
    pub metrics: MetricsSnapshot,
}

impl Report {
    pub(crate) fn build(results: Vec<ExecutionResult>, metrics: MetricsSnapshot) -> Self {
        let total_tasks = results.len();
        let succeeded = results.iter().filter(|r| r.success).count();

        let mut group_stats: HashMap<String, GroupStats> = HashMap::new();
        let mut error_kinds = ErrorKindCounts::default();

        for result in &results {
            if let Some(group) = result.group.as_deref() {
                let stats = group_stats.entry(group.to_string()).or_default();
                stats.total += 1;
                if result.success {
                    stats.succeeded += 1;
                }
            }
            if let Some(error) = &result.error {
                error_kinds.count(error);
            }
        }
        for stats in group_stats.values_mut() {
            stats.success_rate = if stats.total == 0 {
                0.0
            } else {
                stats.succeeded as f64 / stats.total as f64
            };
        }

        Self {
            total_tasks,
            succeeded,
            success_rate: if total_tasks == 0 {
                0.0
            } else {
                succeeded as f64 / total_tasks as f64
            },
            group_stats,
            avg_latency: metrics.avg_latency,
            p90_latency: metrics.p90_latency,
            rate_limit_hits: metrics.rate_limit_hits,
            retries: metrics.retries,
            error_kinds,
            metrics,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::Task;
    use crate::metrics::MetricsAggregator;

    fn result_for(task: &Task, success: bool, error: Option<TaskError>) -> ExecutionResult {
        if success {
            ExecutionResult::succeeded(task, 1, Duration::from_millis(10))
        } else {
            ExecutionResult::failed(task, 1, Duration::from_millis(10), error.unwrap())
        }
    }

    #[test]
    fn test_group_and_overall_rates() {
        let a1 = Task::new("a1", "").with_group("a");
        let a2 = Task::new("a2", "").with_group("a");
        let b1 = Task::new("b1", "").with_group("b");
        let loose = Task::new("x", "");

        let results = vec![
            result_for(&a1, true, None),
            result_for(&a2, false, Some(TaskError::Permanent { error: "e".into() })),
            result_for(&b1, true, None),
            result_for(&loose, true, None),
        ];
        let report = Report::build(results, MetricsAggregator::new(10, 0.0).snapshot());

        assert_eq!(report.total_tasks, 4);
        assert_eq!(report.succeeded, 3);
        assert!((report.success_rate - 0.75).abs() < 1e-9);

        let a = &report.group_stats["a"];
        assert_eq!((a.total, a.succeeded), (2, 1));
        assert!((a.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(report.group_stats["b"].success_rate, 1.0);
        assert!(!report.group_stats.contains_key("x"));
    }

    #[test]
    fn test_error_kinds_always_fully_shaped() {
        let t = Task::new("t", "");
        let results = vec![
            result_for(&t, false, Some(TaskError::CircuitOpen)),
            result_for(&t, false, Some(TaskError::ExhaustedRetries { attempts: 4, last: "x".into() })),
        ];
        let report = Report::build(results, MetricsAggregator::new(10, 0.0).snapshot());

        assert_eq!(report.error_kinds.circuit_open, 1);
        assert_eq!(report.error_kinds.exhausted_retries, 1);
        assert_eq!(report.error_kinds.permanent, 0);
        assert_eq!(report.error_kinds.transient, 0);
        assert_eq!(report.error_kinds.canceled, 0);
        assert_eq!(report.error_kinds.total(), 2);
    }

    #[test]
    fn test_empty_run() {
        let report = Report::build(vec![], MetricsAggregator::new(10, 0.0).snapshot());
        assert_eq!(report.total_tasks, 0);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.group_stats.is_empty());
    }
}
