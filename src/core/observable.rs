//! Observable value: publish-on-mutate.
//!
//! Every write replaces the shared `Arc<T>` and notifies observers two ways:
//! async receivers through a tokio `watch` channel, and synchronous hooks that
//! run before `set` returns (used to chain derived collections).

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use super::subscription::{Listener, ListenerSet, Subscription};

pub struct Observable<T> {
    sender: watch::Sender<Arc<T>>,
    hooks: ListenerSet,
}

impl<T> Observable<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(Arc::new(value));
        Self { sender, hooks: ListenerSet::new() }
    }

    /// Current value. Cheap: clones the `Arc`.
    pub fn get(&self) -> Arc<T> { self.sender.borrow().clone() }

    pub fn set(&self, value: T) { self.replace(Arc::new(value)); }

    pub fn replace(&self, value: Arc<T>) {
        self.sender.send_replace(value);
        self.hooks.emit();
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> { self.sender.subscribe() }

    /// Run `listener` synchronously after every write.
    pub fn on_change(&self, listener: Listener) -> Subscription { self.hooks.add(listener) }
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Republish the current contents under a fresh `Arc`.
    pub fn touch(&self) {
        let current = self.get();
        self.set(T::clone(&current));
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").field("value", &*self.sender.borrow()).finish()
    }
}
