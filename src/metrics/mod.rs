//! Thread-safe metrics aggregation.
//!
//! ## Contents
//! - [`MetricsAggregator`] counters, bounded latency history, probabilistic
//!   memory sampling
//! - [`MetricsSnapshot`] internally-consistent read-only view
//!
//! The aggregator is shared by reference across all workers; every mutation
//! takes one short-lived lock and `snapshot()` copies under the same lock, so
//! snapshots are consistent but may be stale relative to concurrent writers.

mod aggregator;
mod memory;

pub use aggregator::{MetricsAggregator, MetricsSnapshot};
