//! Admission control and failure gating.
//!
//! This module contains the two passive, lock-protected gates every worker
//! consults before dispatching a call:
//! - [`SlidingWindowLimiter`]: bounds admissions inside a trailing time window;
//! - [`CircuitBreaker`]: fails fast after consecutive downstream failures.
//!
//! Both are shared by reference (`Arc`) across all workers; each has its own
//! lock and neither holds it across an `.await` into another component.

mod breaker;
mod limiter;

pub use breaker::CircuitBreaker;
pub use limiter::SlidingWindowLimiter;
