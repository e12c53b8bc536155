//! Retry delay policies.
//!
//! This module groups the knobs that control **how long** to wait between
//! attempts after a transient failure.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! Config { base_delay, max_delay, backoff_factor, jitter }
//!      └─► exec::RetryExecutor uses backoff.delay(attempt) to schedule
//!          the sleep before the next attempt
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=60s, jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` for balanced randomness.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
