//! # Tasks, calls, and error classification.
//!
//! This module provides the types that describe **what** the harness executes:
//! - [`Task`] - immutable unit of work (id, opaque payload, optional group)
//! - [`Call`] - trait for the caller-supplied external call
//! - [`CallFn`] - closure-backed call implementation
//! - [`CallRef`] - shared reference to a call (`Arc<dyn Call>`)
//! - [`Classify`] / [`SignatureClassifier`] - pluggable failure classification

mod call;
mod call_fn;
mod classify;
mod task;

pub use call::{Call, CallRef};
pub use call_fn::CallFn;
pub use classify::{Classify, FailureKind, SignatureClassifier};
pub use task::Task;
