//! # Per-task execution outcome.
//!
//! One [`ExecutionResult`] is produced for every submitted task, successful
//! or not. Results arrive in completion order, so callers correlate them back
//! to tasks via [`ExecutionResult::task_id`], never via position.

use std::sync::Arc;
use std::time::Duration;

use crate::calls::Task;
use crate::error::TaskError;

/// Final outcome of running one task through the retry executor.
///
/// Immutable once created; owned by the dispatcher's result list.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Identifier of the task this result belongs to.
    pub task_id: Arc<str>,
    /// Group label carried over from the task, if any.
    pub group: Option<Arc<str>>,
    /// Whether the task eventually succeeded.
    pub success: bool,
    /// Attempts actually made (0 if the breaker rejected before the first).
    pub attempts: u32,
    /// Wall time from first gate check to finalization, including waits.
    pub elapsed: Duration,
    /// Final classified error for failed tasks.
    pub error: Option<TaskError>,
}

impl ExecutionResult {
    /// Builds a successful result.
    pub(crate) fn succeeded(task: &Task, attempts: u32, elapsed: Duration) -> Self {
        Self {
            task_id: task.id_arc(),
            group: task.group_arc(),
            success: true,
            attempts,
            elapsed,
            error: None,
        }
    }

    /// Builds a failed result carrying the final error.
    pub(crate) fn failed(task: &Task, attempts: u32, elapsed: Duration, error: TaskError) -> Self {
        Self {
            task_id: task.id_arc(),
            group: task.group_arc(),
            success: false,
            attempts,
            elapsed,
            error: Some(error),
        }
    }

    /// Stable label of the final error, if the task failed.
    pub fn error_label(&self) -> Option<&'static str> {
        self.error.as_ref().map(TaskError::as_label)
    }
}
