//! # Unit of work submitted to the dispatcher.
//!
//! A [`Task`] bundles an identifier, an opaque payload, and an optional group
//! label used for per-group statistics in the final report. The harness never
//! interprets the payload; it is handed to the external call as-is.
//!
//! Tasks are immutable: created by the caller, consumed once by the
//! dispatcher. Results are correlated back to tasks via [`Task::id`] — never
//! via ordering, which the harness does not guarantee.

use std::sync::Arc;

/// Immutable unit of work.
///
/// ## Example
/// ```rust
/// use taskgate::Task;
///
/// let t = Task::new("req-1", "what is 2+2?").with_group("math");
/// assert_eq!(t.id(), "req-1");
/// assert_eq!(t.group(), Some("math"));
/// ```
#[derive(Clone, Debug)]
pub struct Task {
    id: Arc<str>,
    payload: Arc<str>,
    group: Option<Arc<str>>,
}

impl Task {
    /// Creates a new task with the given identifier and opaque payload.
    pub fn new(id: impl Into<Arc<str>>, payload: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            group: None,
        }
    }

    /// Returns a new task carrying a group label.
    pub fn with_group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Returns the stable task identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the opaque payload (never interpreted by the harness).
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the group label, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the shared identifier handle (cheap to clone into events/results).
    pub(crate) fn id_arc(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    /// Returns the shared group handle, if any.
    pub(crate) fn group_arc(&self) -> Option<Arc<str>> {
        self.group.clone()
    }
}
