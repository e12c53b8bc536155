//! Execution core: per-task retry loop and the batch dispatcher.
//!
//! ## Contents
//! - [`RetryExecutor`]: runs one task to completion-or-exhaustion through the
//!   breaker, limiter, and backoff policy;
//! - [`Dispatcher`]: bounded worker pool over a shared task queue, collecting
//!   results and aggregating the final [`Report`];
//! - [`ExecutionResult`]: per-task outcome record;
//! - [`Report`], [`GroupStats`], [`ErrorKindCounts`]: aggregate output.

mod dispatcher;
mod executor;
mod report;
mod result;

pub use dispatcher::Dispatcher;
pub use executor::RetryExecutor;
pub use report::{ErrorKindCounts, GroupStats, Report};
pub use result::ExecutionResult;
