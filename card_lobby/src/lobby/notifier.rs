//! Roster change notification.
//!
//! The roster calls its observer synchronously, inside the mutation and while
//! it still holds the write lock, so observers see snapshots in version order.
//! Observers must return quickly: anything slow (rendering, socket writes)
//! belongs behind a channel.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::roster::RosterSnapshot;

/// Default capacity of the broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Receives the new roster after every mutation
pub trait RosterObserver: Send + Sync {
    fn on_roster_changed(&self, snapshot: &RosterSnapshot);
}

impl<F> RosterObserver for F
where
    F: Fn(&RosterSnapshot) + Send + Sync,
{
    fn on_roster_changed(&self, snapshot: &RosterSnapshot) {
        self(snapshot)
    }
}

/// Observer for lobbies nobody is watching
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RosterObserver for NoopObserver {
    fn on_roster_changed(&self, _snapshot: &RosterSnapshot) {}
}

/// Fans roster snapshots out to any number of async subscribers.
///
/// Sending never blocks. A subscriber that falls more than the channel
/// capacity behind gets `RecvError::Lagged` and should resynchronise from
/// `LobbySession::snapshot`.
#[derive(Debug, Clone)]
pub struct RosterBroadcaster {
    sender: broadcast::Sender<RosterSnapshot>,
}

impl RosterBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to roster updates
    pub fn subscribe(&self) -> broadcast::Receiver<RosterSnapshot> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RosterBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl RosterObserver for RosterBroadcaster {
    fn on_roster_changed(&self, snapshot: &RosterSnapshot) {
        // Err only means there are no subscribers right now
        if self.sender.send(snapshot.clone()).is_err() {
            log::trace!("Roster v{} broadcast with no subscribers", snapshot.version);
        }
    }
}

/// Forwards each notification to several observers, in insertion order
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RosterObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn RosterObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RosterObserver for ObserverSet {
    fn on_roster_changed(&self, snapshot: &RosterSnapshot) {
        for observer in &self.observers {
            observer.on_roster_changed(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::{roster::LobbyPhase, slot::Slot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(version: u64) -> RosterSnapshot {
        RosterSnapshot {
            version,
            phase: LobbyPhase::Waiting,
            slots: vec![Slot::local(0, "Alice", 0), Slot::open(1)],
        }
    }

    #[test]
    fn test_broadcast_without_subscribers_is_noop() {
        let broadcaster = RosterBroadcaster::default();
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.on_roster_changed(&snapshot(1));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let broadcaster = RosterBroadcaster::new(4);
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.on_roster_changed(&snapshot(7));

        assert_eq!(first.recv().await.unwrap().version, 7);
        assert_eq!(second.recv().await.unwrap().version, 7);
    }

    #[test]
    fn test_observer_set_calls_all_in_order() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let a = {
            let calls = calls.clone();
            move |_: &RosterSnapshot| calls.lock().unwrap().push("a")
        };
        let b = {
            let calls = calls.clone();
            move |_: &RosterSnapshot| calls.lock().unwrap().push("b")
        };
        let set = ObserverSet::new().with(Arc::new(a)).with(Arc::new(b));
        assert_eq!(set.len(), 2);

        set.on_roster_changed(&snapshot(1));
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_closure_observer() {
        let count = Arc::new(AtomicUsize::new(0));
        let observer = {
            let count = count.clone();
            move |_: &RosterSnapshot| {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        observer.on_roster_changed(&snapshot(1));
        observer.on_roster_changed(&snapshot(2));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
