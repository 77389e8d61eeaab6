// Change notification for store subscribers

use crate::task::Task;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Callback = Arc<dyn Fn(&[Task]) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback)>>,
}

impl Registry {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        // A listener panicking elsewhere must not wedge the registry
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Registered change listeners, notified in registration order
#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Registry>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Task]) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.entries().push((id, Arc::new(listener)));
        debug!(listener = id, "subscribed");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Call every listener with the full collection
    ///
    /// Callbacks run outside the registry lock, so a listener may
    /// unsubscribe (itself or others) while being notified. Removals take
    /// effect from the next notification.
    pub fn notify(&self, tasks: &[Task]) {
        let callbacks: Vec<Callback> = self.registry.entries().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback(tasks);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.registry.entries().clear();
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: std::sync::Weak<Registry>,
}

impl Subscription {
    /// Remove exactly the listener this handle was issued for
    ///
    /// Returns whether a listener was removed; calling it again is a no-op.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut entries = registry.entries();
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        let removed = entries.len() != before;
        if removed {
            debug!(listener = self.id, "unsubscribed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_in_registration_order() {
        let listeners = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let seen = seen.clone();
            listeners.subscribe(move |_| seen.lock().unwrap().push(name));
        }

        listeners.notify(&[]);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_by_identity() {
        let listeners = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));

        // Two listeners with identical behaviour
        let h1 = hits.clone();
        let first = listeners.subscribe(move |_| {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        let h2 = hits.clone();
        let _second = listeners.subscribe(move |_| {
            h2.fetch_add(1, Ordering::SeqCst);
        });

        assert!(first.unsubscribe());
        assert!(!first.unsubscribe());
        assert_eq!(listeners.len(), 1);

        listeners.notify(&[]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let listeners = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let (h, s) = (hits.clone(), slot.clone());
        let sub = listeners.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        listeners.notify(&[]);
        listeners.notify(&[]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let listeners = Listeners::new();
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        assert!(!sub.unsubscribe());
    }
}
