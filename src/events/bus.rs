//! # Broadcast bus for runtime events.
//!
//! Every component that has something to say — workers, the retry executor,
//! the dispatcher, subscriber workers reporting faults — publishes through one
//! [`Bus`]. Consumers attach independent receivers; the dispatcher's
//! subscriber listener is the usual one, but callers may attach their own.
//!
//! ```text
//! Publishers (many):                 Receivers (any number):
//!   Worker 1 ──┐                        ┌──► subscriber listener
//!   Worker 2 ──┼──────► Bus ────────────┼──► caller-attached receiver
//!   Executor ──┘   (broadcast ring)     └──► ...
//! ```
//!
//! Publishing never blocks and never fails: with no receivers attached the
//! event is simply discarded. The ring buffer is bounded; a receiver that
//! falls more than `capacity` events behind observes `RecvError::Lagged(n)`
//! and skips the `n` oldest events. Use [`Event::seq`] to detect and reorder
//! across such gaps — delivery is best-effort, ordering is recoverable.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the shared broadcast channel.
///
/// Cloning is cheap (the sender is `Arc`-backed internally); every clone
/// publishes into the same ring buffer.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` events (minimum 1).
    ///
    /// Capacity is shared across all receivers, not per-receiver: one slow
    /// receiver lagging does not consume another receiver's budget, but both
    /// read from the same bounded history.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all currently attached receivers.
    ///
    /// Fire-and-forget: returns immediately, succeeds even with zero
    /// receivers (the event is dropped).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Attaches a new independent receiver.
    ///
    /// The receiver observes only events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of currently attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_without_receivers_is_a_noop() {
        let bus = Bus::new(4);
        assert_eq!(bus.receiver_count(), 0);
        bus.publish(Event::new(EventKind::RunStarted)); // must not panic or block
    }

    #[tokio::test]
    async fn test_receivers_see_events_in_sequence_order() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::RunStarted));
        bus.publish(Event::new(EventKind::RunFinished));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::RunStarted);
        assert_eq!(second.kind, EventKind::RunFinished);
        assert!(first.seq < second.seq, "seq restores publish order");
    }

    #[tokio::test]
    async fn test_lagged_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..5 {
            bus.publish(Event::new(EventKind::CallStarting));
        }

        // Ring holds the 2 newest; the first recv reports the 3 skipped.
        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(n)) => assert_eq!(n, 3),
            other => panic!("expected lag, got {other:?}"),
        }
        assert!(rx.recv().await.is_ok());
        assert!(rx.recv().await.is_ok());
    }
}
