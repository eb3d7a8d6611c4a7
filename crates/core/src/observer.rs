//! Observer registration and subscription handles
//!
//! Hosts fan notifications out through an [`ObserverList`]. Each registration
//! returns a [`Subscription`] that must be released explicitly with
//! [`Subscription::unsubscribe`]; dropping the handle leaves the observer
//! registered.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Single-method callback invoked when observed state changes
pub trait StateObserver<E>: Send + Sync {
    fn on_state_changed(&self, event: &E);
}

impl<E, F> StateObserver<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_state_changed(&self, event: &E) {
        self(event)
    }
}

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Handle for one observer registration
pub struct Subscription {
    id: u64,
    unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(id: u64, unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A handle that was never attached to anything
    pub fn inert() -> Self {
        Self {
            id: 0,
            unsubscribe: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the observer from its source
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            trace!("Unsubscribing observer {}", self.id);
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

struct Registry<E> {
    next_id: AtomicU64,
    observers: DashMap<u64, Arc<dyn StateObserver<E>>>,
}

/// Registry of observers for one kind of event
pub struct ObserverList<E> {
    registry: Arc<Registry<E>>,
}

impl<E: 'static> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                observers: DashMap::new(),
            }),
        }
    }

    /// Register an observer and return its handle
    pub fn subscribe(&self, observer: Arc<dyn StateObserver<E>>) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.observers.insert(id, observer);

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription::new(id, move || {
            if let Some(registry) = registry.upgrade() {
                registry.observers.remove(&id);
            }
        })
    }

    /// Deliver `event` to every registered observer in registration order
    ///
    /// Observers are snapshotted first so callbacks may subscribe or
    /// unsubscribe without deadlocking the map.
    pub fn notify(&self, event: &E) -> usize {
        let mut snapshot: Vec<(u64, Arc<dyn StateObserver<E>>)> = self
            .registry
            .observers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);

        for (_, observer) in &snapshot {
            observer.on_state_changed(event);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.registry.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.observers.is_empty()
    }
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}
