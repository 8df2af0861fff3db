//! Event fan-out to registered listeners.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dutybell_protocol::EventRecord;
use tokio::sync::RwLock;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Listener trait
// ---------------------------------------------------------------------------

/// A consumer of decoded game events.
///
/// Listeners are called inline on the capture pump, so `on_event` must
/// return quickly; hand the record to a channel or task if the real work
/// is slow. A returned error is logged and the remaining listeners still
/// run, one faulty consumer cannot starve the others.
///
/// Closures with the right shape are listeners too:
///
/// ```ignore
/// dispatcher.subscribe(|record: &EventRecord| -> anyhow::Result<()> {
///     println!("{record:?}");
///     Ok(())
/// });
/// ```
pub trait EventListener: Send + Sync + 'static {
    fn on_event(&self, record: &EventRecord) -> anyhow::Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&EventRecord) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn on_event(&self, record: &EventRecord) -> anyhow::Result<()> {
        self(record)
    }
}

/// Identifies one subscription, for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Fans each [`EventRecord`] out to every registered listener, in
/// subscription order.
///
/// Publishing takes a snapshot of the listener list first, so a
/// subscription made while an event is in flight only sees the next
/// event, and unsubscribing never races the running delivery.
pub struct EventDispatcher {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn EventListener>)>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_listeners(Vec::new())
    }

    /// Creates a dispatcher pre-seeded with listeners, which receive ids
    /// in the order given.
    pub fn with_listeners(listeners: Vec<Arc<dyn EventListener>>) -> Self {
        let seeded: Vec<(ListenerId, Arc<dyn EventListener>)> = listeners
            .into_iter()
            .enumerate()
            .map(|(n, listener)| (ListenerId(n as u64 + 1), listener))
            .collect();
        let next_id = seeded.len() as u64 + 1;
        Self {
            listeners: RwLock::new(seeded),
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Registers a listener and returns its id.
    pub async fn subscribe(&self, listener: impl EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().await.push((id, Arc::new(listener)));
        debug!(listener = %id, "listener subscribed");
        id
    }

    /// Removes a listener. Returns `false` if the id was not registered.
    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().await;
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        let removed = listeners.len() < before;
        if removed {
            debug!(listener = %id, "listener unsubscribed");
        }
        removed
    }

    /// Delivers one record to every listener. Returns how many were
    /// invoked.
    pub async fn publish(&self, record: &EventRecord) -> usize {
        let snapshot: Vec<(ListenerId, Arc<dyn EventListener>)> =
            self.listeners.read().await.clone();

        debug!(
            process = %record.process,
            kind = %record.event.kind(),
            listeners = snapshot.len(),
            "dispatching event"
        );

        for (id, listener) in &snapshot {
            if let Err(error) = listener.on_event(record) {
                warn!(listener = %id, %error, "event listener failed");
            }
        }
        snapshot.len()
    }

    pub async fn len(&self) -> usize {
        self.listeners.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listeners.read().await.is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
