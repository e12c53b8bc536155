//! Error types used by the taskgate harness and per-call execution.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] — errors raised by the harness itself (bad configuration).
//! - [`TaskError`] — classified failures of individual call executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics,
//! and [`TaskError::is_retryable`] drives the retry loop.
//!
//! The opaque error produced by the external call is [`CallError`]; it is never
//! interpreted beyond (heuristic) classification into a [`TaskError`].

use thiserror::Error;

/// Opaque error returned by the caller-supplied external call.
///
/// The harness never inspects its payload, only its success/failure and
/// (heuristically) its display text for classification.
pub type CallError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the taskgate harness.
///
/// These represent programmer errors in harness setup, never per-task
/// failures — one task's failure is captured into its
/// [`ExecutionResult`](crate::ExecutionResult) and cannot abort a batch.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration failed validation before the run started.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
        }
    }
}

/// # Classified failures of call execution.
///
/// Produced by the retry executor after classifying the opaque [`CallError`]
/// (see [`Classify`](crate::Classify)) or by the harness's own gates.
/// Only [`TaskError::Transient`] is retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Retryable failure (rate-limit, timeout, or transport signatures).
    #[error("transient failure: {error}")]
    Transient {
        /// The underlying error message.
        error: String,
    },

    /// Non-retryable failure (still recorded in metrics and the report).
    #[error("permanent failure (no retry): {error}")]
    Permanent {
        /// The underlying error message.
        error: String,
    },

    /// Circuit breaker was open; the call was never invoked.
    #[error("circuit open: call rejected without dispatch")]
    CircuitOpen,

    /// All retry attempts were spent on transient failures.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    ExhaustedRetries {
        /// Total attempts made (`max_retries + 1`).
        attempts: u32,
        /// Message of the last transient failure.
        last: String,
    },

    /// The run was cancelled before this task finished.
    #[error("run cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// let err = TaskError::CircuitOpen;
    /// assert_eq!(err.as_label(), "circuit_open");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Transient { .. } => "transient",
            TaskError::Permanent { .. } => "permanent",
            TaskError::CircuitOpen => "circuit_open",
            TaskError::ExhaustedRetries { .. } => "exhausted_retries",
            TaskError::Canceled => "canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Transient { error } => format!("transient: {error}"),
            TaskError::Permanent { error } => format!("permanent: {error}"),
            TaskError::CircuitOpen => "circuit open".to_string(),
            TaskError::ExhaustedRetries { attempts, last } => {
                format!("exhausted after {attempts} attempts: {last}")
            }
            TaskError::Canceled => "cancelled".to_string(),
        }
    }

    /// Indicates whether the retry loop may attempt the call again.
    ///
    /// Returns `true` only for [`TaskError::Transient`].
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// let retryable = TaskError::Transient { error: "429".into() };
    /// assert!(retryable.is_retryable());
    ///
    /// let fatal = TaskError::Permanent { error: "bad request".into() };
    /// assert!(!fatal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Transient { .. })
    }
}
