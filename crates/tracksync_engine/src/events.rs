//! Event fan-out for queue observers.
//!
//! Every subscriber owns a channel receiver. Events are delivered
//! synchronously at emission time, in emission order, to every subscriber
//! whose filter matches. There is no history: a late subscriber only sees
//! events emitted after it subscribed and should read
//! [`SyncQueue::state`](crate::SyncQueue::state) to catch up.
//!
//! ```rust,ignore
//! let events = queue.subscribe(None);
//! std::thread::spawn(move || {
//!     while let Some(event) = events.recv() {
//!         println!("{event:?}");
//!     }
//! });
//! ```

use crate::job::Job;
use crate::state::{QueueState, SyncStatus};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Kind of a [`SyncEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`SyncEvent::StatusChange`].
    StatusChange,
    /// [`SyncEvent::SyncComplete`].
    SyncComplete,
    /// [`SyncEvent::SyncError`].
    SyncError,
    /// [`SyncEvent::Conflict`].
    Conflict,
}

/// Details of a detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEvent {
    /// Commits only present locally.
    pub ahead: u32,
    /// Commits only present on the remote.
    pub behind: u32,
    /// Human-readable description.
    pub message: String,
    /// Whether the working tree contains unresolved merge conflicts.
    pub has_conflicts: bool,
}

/// An event emitted by a sync queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The queue status changed.
    StatusChange {
        /// New status.
        status: SyncStatus,
        /// Full state after the change.
        state: QueueState,
    },
    /// The drain loop emptied the pending list.
    SyncComplete {
        /// Completion time.
        timestamp: DateTime<Utc>,
    },
    /// A job failed.
    SyncError {
        /// The failed job.
        job: Job,
        /// Failure message.
        error: String,
    },
    /// Divergence or merge conflicts were detected.
    Conflict(ConflictEvent),
}

impl SyncEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::StatusChange { .. } => EventKind::StatusChange,
            SyncEvent::SyncComplete { .. } => EventKind::SyncComplete,
            SyncEvent::SyncError { .. } => EventKind::SyncError,
            SyncEvent::Conflict(_) => EventKind::Conflict,
        }
    }
}

struct Subscriber {
    filter: Option<EventKind>,
    tx: Sender<SyncEvent>,
}

impl Subscriber {
    fn wants(&self, kind: EventKind) -> bool {
        self.filter.map_or(true, |filter| filter == kind)
    }
}

/// Distributes queue events to subscribers.
///
/// Subscribers whose receiver has been dropped are removed on the next
/// event they would have received.
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    /// Creates an event bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to events of `kind`, or to every event if `None`.
    pub fn subscribe(&self, kind: Option<EventKind>) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(Subscriber { filter: kind, tx });
        Subscription { rx }
    }

    /// Emits an event to all matching subscribers.
    pub fn emit(&self, event: SyncEvent) {
        let kind = event.kind();
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sub| !sub.wants(kind) || sub.tx.send(event.clone()).is_ok());
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an event subscription.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// stops delivery.
pub struct Subscription {
    rx: Receiver<SyncEvent>,
}

impl Subscription {
    /// Blocks until the next event. Returns `None` once the queue is gone.
    pub fn recv(&self) -> Option<SyncEvent> {
        self.rx.recv().ok()
    }

    /// Blocks until the next event or until `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SyncEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }

    /// Returns every event queued so far without blocking.
    pub fn drain(&self) -> Vec<SyncEvent> {
        self.rx.try_iter().collect()
    }

    /// Stops receiving events.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn complete() -> SyncEvent {
        SyncEvent::SyncComplete {
            timestamp: Utc::now(),
        }
    }

    fn error() -> SyncEvent {
        SyncEvent::SyncError {
            job: Job::push(),
            error: "no credential available".into(),
        }
    }

    #[test]
    fn emit_and_receive() {
        let bus = EventBus::new();
        let sub = bus.subscribe(None);

        let event = complete();
        bus.emit(event.clone());

        assert_eq!(sub.recv_timeout(Duration::from_millis(100)), Some(event));
    }

    #[test]
    fn multiple_subscribers_see_same_order() {
        let bus = EventBus::new();
        let a = bus.subscribe(None);
        let b = bus.subscribe(None);

        bus.emit(error());
        bus.emit(complete());

        let kinds = |sub: &Subscription| sub.drain().iter().map(SyncEvent::kind).collect::<Vec<_>>();
        assert_eq!(kinds(&a), vec![EventKind::SyncError, EventKind::SyncComplete]);
        assert_eq!(kinds(&b), vec![EventKind::SyncError, EventKind::SyncComplete]);
    }

    #[test]
    fn filtered_subscription() {
        let bus = EventBus::new();
        let errors = bus.subscribe(Some(EventKind::SyncError));

        bus.emit(complete());
        bus.emit(error());

        let events = errors.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::SyncError);
    }

    #[test]
    fn unsubscribe_removes_subscriber() {
        let bus = EventBus::new();
        let sub = bus.subscribe(None);
        assert_eq!(bus.subscriber_count(), 1);

        sub.unsubscribe();
        bus.emit(complete());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.emit(complete());

        let sub = bus.subscribe(None);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn threaded_receive() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.subscribe(None);

        let bus_clone = Arc::clone(&bus);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            bus_clone.emit(error());
        });

        let received = sub.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(received.kind(), EventKind::SyncError);

        handle.join().unwrap();
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SyncEvent::Conflict(ConflictEvent {
            ahead: 2,
            behind: 3,
            message: "diverged".into(),
            has_conflicts: false,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "conflict");
        assert_eq!(json["ahead"], 2);
        assert_eq!(json["behind"], 3);
    }
}
