//! # Call abstraction for the opaque external collaborator.
//!
//! This module defines the [`Call`] trait, the seam between the harness and
//! whatever the caller actually dispatches (model inference request,
//! subprocess, HTTP call). The common handle type is [`CallRef`], an
//! `Arc<dyn Call>` shared by every worker.
//!
//! The harness only observes success or failure; the error payload is opaque
//! and is classified heuristically (see [`Classify`](crate::Classify)).

use async_trait::async_trait;
use std::sync::Arc;

use crate::calls::task::Task;
use crate::error::CallError;

/// Shared handle to a call implementation.
pub type CallRef = Arc<dyn Call>;

/// # The caller-supplied external call.
///
/// One `invoke` executes one attempt for one task. The harness assumes the
/// call is blocking I/O from the worker's perspective: cancellation is never
/// observed mid-call, only between attempts.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use taskgate::{Call, CallError, Task};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Call for Echo {
///     async fn invoke(&self, task: &Task) -> Result<(), CallError> {
///         let _ = task.payload();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Call: Send + Sync + 'static {
    /// Executes one attempt for `task`.
    ///
    /// Errors are opaque to the harness; they are recorded and classified but
    /// never interpreted beyond their display text.
    async fn invoke(&self, task: &Task) -> Result<(), CallError>;
}
