//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::events::Event) to
//! multiple subscribers **without awaiting** their processing, so a slow or
//! broken subscriber can never stall the dispatcher or the workers.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught; the fault is reported as a
//!   [`SubscriberPanicked`](crate::events::EventKind::SubscriberPanicked)
//!   event and the subscriber keeps running.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers (use `Event::seq`).
//! - No retries on per-subscriber queue overflow: the event is dropped for
//!   that subscriber and a
//!   [`SubscriberOverflow`](crate::events::EventKind::SubscriberOverflow)
//!   event is published instead.
//!
//! Fault events are themselves never re-reported, so an overflowing
//! subscriber cannot amplify its own backlog through the fault channel.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};

use super::Subscribe;

/// One subscriber's bounded inbox plus its identity.
struct Inbox {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    inboxes: Vec<Inbox>,
    workers: Vec<JoinHandle<()>>,
    faults: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// `faults` receives [`SubscriberOverflow`](EventKind::SubscriberOverflow)
    /// and [`SubscriberPanicked`](EventKind::SubscriberPanicked) events; it is
    /// usually the same bus the rest of the harness publishes to.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, faults: Bus) -> Self {
        let mut inboxes = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            inboxes.push(Inbox {
                name: sub.name(),
                tx,
            });
            workers.push(tokio::spawn(Self::drive(sub, rx, faults.clone())));
        }

        Self {
            inboxes,
            workers,
            faults,
        }
    }

    /// Worker loop for one subscriber: drain the inbox, isolate panics.
    async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, faults: Bus) {
        while let Some(ev) = rx.recv().await {
            let report_faults = !is_fault(ev.kind);
            let fut = sub.on_event(ev.as_ref());
            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                if report_faults {
                    faults.publish(Event::subscriber_panicked(
                        sub.name(),
                        panic_message(panic_err.as_ref()),
                    ));
                }
            }
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped
    /// for it and an overflow event is published in its place.
    pub fn emit(&self, event: &Event) {
        let report_faults = !is_fault(event.kind);
        let ev = Arc::new(event.clone());

        for inbox in &self.inboxes {
            let reason = match inbox.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker closed",
            };
            if report_faults {
                self.faults
                    .publish(Event::subscriber_overflow(inbox.name, reason));
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.inboxes);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }
}

fn is_fault(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
