//! # Function-backed call (`CallFn`)
//!
//! [`CallFn`] wraps a closure `F: Fn(Task) -> Fut`, producing a fresh future
//! per attempt. This avoids shared mutable state inside the closure; if shared
//! state is needed, capture an `Arc<...>` explicitly.
//!
//! ## Concurrency semantics
//! - Every attempt calls the closure again with its own clone of the task.
//! - Workers share one `CallFn` via [`CallRef`](crate::CallRef); the closure
//!   must therefore be `Fn`, not `FnMut`.
//!
//! ## Example
//! ```rust
//! use taskgate::{CallError, CallFn, CallRef, Task};
//!
//! let call: CallRef = CallFn::arc(|task: Task| async move {
//!     if task.payload().is_empty() {
//!         return Err("empty payload".into());
//!     }
//!     Ok::<_, CallError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::calls::call::Call;
use crate::calls::task::Task;
use crate::error::CallError;

/// Function-backed call implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
pub struct CallFn<F> {
    f: F,
}

impl<F> CallFn<F> {
    /// Creates a new function-backed call.
    ///
    /// Prefer [`CallFn::arc`] when you immediately need a [`CallRef`](crate::CallRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the call and returns it as a shared handle (`Arc<CallFn>`).
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Call for CallFn<F>
where
    F: Fn(Task) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), CallError>> + Send + 'static,
{
    async fn invoke(&self, task: &Task) -> Result<(), CallError> {
        (self.f)(task.clone()).await
    }
}
