//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [run-started] tasks=12
//! [starting] task=req-3 attempt=1
//! [failed] task=req-3 err="429 too many requests" attempt=1
//! [retry] task=req-3 delay_ms=2000 after_attempt=1
//! [circuit-opened] task=req-3
//! [circuit-rejected] task=req-4
//! [succeeded] task=req-3 attempt=2
//! [run-finished]
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics export.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RunStarted => {
                println!("[run-started] tasks={:?}", e.attempt);
            }
            EventKind::RunFinished => {
                println!("[run-finished]");
            }
            EventKind::RunCancelled => {
                println!("[run-cancelled]");
            }
            EventKind::CallStarting => {
                if let (Some(task), Some(att)) = (&e.task, e.attempt) {
                    println!("[starting] task={task} attempt={att}");
                }
            }
            EventKind::CallSucceeded => {
                println!("[succeeded] task={:?} attempt={:?}", e.task, e.attempt);
            }
            EventKind::CallFailed => {
                println!(
                    "[failed] task={:?} err={:?} attempt={:?}",
                    e.task, e.reason, e.attempt
                );
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry] task={:?} delay_ms={:?} after_attempt={:?}",
                    e.task, e.delay_ms, e.attempt
                );
            }
            EventKind::CircuitOpened => {
                println!("[circuit-opened] task={:?}", e.task);
            }
            EventKind::CircuitRejected => {
                println!("[circuit-rejected] task={:?}", e.task);
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[subscriber-fault] sub={:?} reason={:?}", e.task, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
