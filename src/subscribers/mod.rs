//! # Event subscribers for the taskgate harness.
//!
//! This module provides the [`Subscribe`] trait and the non-blocking
//! [`SubscriberSet`] fan-out used by the dispatcher to deliver runtime events
//! broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Executor ── publish(Event) ──► Bus ──► dispatcher listener ──► SubscriberSet
//!                                                                   │
//!                                                         ┌─────────┼─────────┐
//!                                                         ▼         ▼         ▼
//!                                                      LogWriter  custom   custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskgate::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::CallFailed {
//!             // increment failure counter
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
