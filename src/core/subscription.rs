//! Listeners and cancellable subscriptions.
//!
//! Registries, providers and observables all hand out a [`Subscription`] when a
//! listener is attached. Cancelling is explicit: dropping a `Subscription`
//! without calling [`Subscription::unsubscribe`] leaves the listener attached.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Payload-free notification callback.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Lock a mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle returned by every `on`/`subscribe` call.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self { Self { cancel: None } }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

#[derive(Default)]
struct ListenerMap {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Ordered set of listeners that can be fired together.
///
/// Listeners run outside the internal lock, so a listener may subscribe,
/// unsubscribe or emit again without deadlocking.
#[derive(Clone, Default)]
pub struct ListenerSet {
    inner: Arc<Mutex<ListenerMap>>,
}

impl ListenerSet {
    pub fn new() -> Self { Self::default() }

    pub fn add(&self, listener: Listener) -> Subscription {
        let id = {
            let mut map = lock(&self.inner);
            let id = map.next_id;
            map.next_id += 1;
            map.listeners.insert(id, listener);
            id
        };
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).listeners.remove(&id);
            }
        })
    }

    pub fn emit(&self) {
        let listeners: Vec<Listener> = lock(&self.inner).listeners.values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn len(&self) -> usize { lock(&self.inner).listeners.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").field("listeners", &self.len()).finish()
    }
}
