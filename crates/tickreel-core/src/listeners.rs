//! Position-changed observers.
//!
//! The spooler notifies every registered [`StepListener`] after a step's
//! events have been applied. Listeners are called in registration order,
//! synchronously, outside of any playback lock.

use std::sync::Arc;

use tokio::sync::broadcast;

/// Capacity of the [`BroadcastListener`] channel.
pub const BROADCAST_CAPACITY: usize = 256;

/// Observer of playback position changes.
pub trait StepListener: Send + Sync {
    /// Called with the new current step.
    fn on_step_changed(&self, step: u64);
}

impl<F> StepListener for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_step_changed(&self, step: u64) {
        self(step);
    }
}

/// Handle returned by listener registration, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Ordered collection of registered listeners.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn StepListener>)>,
}

impl ListenerRegistry {
    /// Register a listener. Registering the same callback twice yields two
    /// independent registrations.
    pub(crate) fn add(&mut self, listener: Arc<dyn StepListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push((id, listener));
        id
    }

    /// Remove a registration. Returns `false` if `id` is not registered.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Current listeners in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn StepListener>> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Forwards step changes into a [`broadcast`] channel.
///
/// Useful for consumers that want to `await` position changes instead of
/// handling them inside a callback.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<u64>,
}

impl BroadcastListener {
    /// Create a listener with a channel of [`BROADCAST_CAPACITY`].
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe to step changes published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastListener {
    fn default() -> Self {
        Self::new()
    }
}

impl StepListener for BroadcastListener {
    fn on_step_changed(&self, step: u64) {
        // send only fails when nobody is subscribed, which is fine.
        self.tx.send(step).unwrap_or(0);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, Arc<dyn StepListener>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Arc<dyn StepListener> = Arc::new(move |step: u64| sink.lock().unwrap().push(step));
        (seen, listener)
    }

    #[test]
    fn ids_are_distinct_for_duplicate_registrations() {
        let mut registry = ListenerRegistry::default();
        let (seen, listener) = recorder();
        let first = registry.add(Arc::clone(&listener));
        let second = registry.add(listener);
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        for listener in registry.snapshot() {
            listener.on_step_changed(7);
        }
        assert_eq!(*seen.lock().unwrap(), [7, 7]);

        assert!(registry.remove(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let mut registry = ListenerRegistry::default();
        let (_, listener) = recorder();
        let id = registry.add(listener);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn snapshot_keeps_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::default();
        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            registry.add(Arc::new(move |_step: u64| order.lock().unwrap().push(tag)));
        }
        for listener in registry.snapshot() {
            listener.on_step_changed(0);
        }
        assert_eq!(*order.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn broadcast_listener_forwards_steps() {
        let listener = BroadcastListener::new();
        let mut rx = listener.subscribe();
        listener.on_step_changed(3);
        listener.on_step_changed(4);
        assert_eq!(rx.recv().await.unwrap(), 3);
        assert_eq!(rx.recv().await.unwrap(), 4);
    }

    #[test]
    fn broadcast_without_subscribers_is_fine() {
        BroadcastListener::new().on_step_changed(1);
    }
}
