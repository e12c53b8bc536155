//! # Global harness configuration.
//!
//! Provides [`Config`], the centralized settings for a dispatch run.
//!
//! Config is used in two ways:
//! 1. **Dispatcher creation**: `Dispatcher::new(config, subscribers)`
//! 2. **Component construction**: limiter/breaker/backoff/metrics each read
//!    their slice of the config when the dispatcher wires them up.
//!
//! All timing knobs drive `tokio::time`, so tests with a paused runtime clock
//! observe them deterministically.

use std::time::Duration;

use crate::error::RuntimeError;
use crate::policies::{BackoffPolicy, JitterPolicy};

/// Global configuration for a dispatch run.
///
/// Defines:
/// - **Retry behavior**: max retries, backoff base/cap/factor, jitter
/// - **Admission control**: sliding-window size and capacity
/// - **Circuit breaking**: failure threshold and cooldown
/// - **Concurrency**: worker pool size
/// - **Metrics**: latency buffer size and memory sampling rate
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `max_retries`: extra attempts after the first (`0` = single attempt)
/// - `memory_sample_rate`: probability in `[0, 1]` of sampling process RSS
///   per recorded outcome (`0.0` = never, `1.0` = every outcome)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the Bus)
///
/// All fields are public for flexibility; [`Config::validate`] is called by
/// the dispatcher before a run and rejects inconsistent values.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of retries after the first attempt.
    ///
    /// The external call is invoked at most `max_retries + 1` times per task.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound on any computed retry delay.
    pub max_delay: Duration,

    /// Multiplicative backoff growth factor (must be `>= 1.0`).
    pub backoff_factor: f64,

    /// Randomization applied to computed delays (default: none).
    pub jitter: JitterPolicy,

    /// Length of the trailing admission window.
    pub rate_limit_window: Duration,

    /// Maximum admissions inside any trailing `rate_limit_window`.
    pub max_requests_per_window: usize,

    /// Consecutive failures that trip the circuit breaker.
    pub failure_threshold: u32,

    /// How long the breaker stays open before the next caller may pass.
    pub cooldown_duration: Duration,

    /// Number of worker tasks pulling from the shared queue.
    pub concurrency_limit: usize,

    /// Capacity of the bounded latency sample buffer (FIFO eviction).
    pub max_samples: usize,

    /// Probability of sampling process memory per recorded outcome.
    pub memory_sample_rate: f64,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// skip older items. Minimum value is 1 (enforced by the Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Validates the configuration, returning the first violated constraint.
    ///
    /// Called by the dispatcher before any worker is spawned; a run never
    /// starts with an invalid config.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.backoff_factor < 1.0 || !self.backoff_factor.is_finite() {
            return Err(invalid("backoff_factor must be finite and >= 1.0"));
        }
        if self.base_delay > self.max_delay {
            return Err(invalid("base_delay must not exceed max_delay"));
        }
        if self.rate_limit_window.is_zero() {
            return Err(invalid("rate_limit_window must be > 0"));
        }
        if self.max_requests_per_window == 0 {
            return Err(invalid("max_requests_per_window must be > 0"));
        }
        if self.failure_threshold == 0 {
            return Err(invalid("failure_threshold must be > 0"));
        }
        if self.concurrency_limit == 0 {
            return Err(invalid("concurrency_limit must be > 0"));
        }
        if self.max_samples == 0 {
            return Err(invalid("max_samples must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.memory_sample_rate) {
            return Err(invalid("memory_sample_rate must be within [0, 1]"));
        }
        Ok(())
    }

    /// Returns the backoff policy slice of this config.
    #[inline]
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            first: self.base_delay,
            max: self.max_delay,
            factor: self.backoff_factor,
            jitter: self.jitter,
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_retries = 3`
    /// - `base_delay = 1s`, `max_delay = 60s`, `backoff_factor = 2.0`, no jitter
    /// - `rate_limit_window = 60s`, `max_requests_per_window = 50`
    /// - `failure_threshold = 5`, `cooldown_duration = 300s`
    /// - `concurrency_limit = 4`
    /// - `max_samples = 1000`, `memory_sample_rate = 0.1`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
            jitter: JitterPolicy::None,
            rate_limit_window: Duration::from_secs(60),
            max_requests_per_window: 50,
            failure_threshold: 5,
            cooldown_duration: Duration::from_secs(300),
            concurrency_limit: 4,
            max_samples: 1000,
            memory_sample_rate: 0.1,
            bus_capacity: 1024,
        }
    }
}

fn invalid(reason: &str) -> RuntimeError {
    RuntimeError::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let cfg = Config {
            concurrency_limit: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_shrinking_backoff() {
        let cfg = Config {
            backoff_factor: 0.5,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_base_above_max_delay() {
        let cfg = Config {
            base_delay: Duration::from_secs(120),
            max_delay: Duration::from_secs(60),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_sample_rate_out_of_range() {
        let cfg = Config {
            memory_sample_rate: 1.5,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
