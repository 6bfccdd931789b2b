//! Registry-backed list of provider handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::core::{lock, Listener, Observable, Subscription};
use crate::provider::{ProviderEvent, ProviderHandle};
use crate::registry::{Registry, RegistryEvent};

pub struct ProviderCollection {
    pub(super) inner: Arc<ProvidersInner>,
}

pub(super) struct ProvidersInner {
    registry: Arc<dyn Registry>,
    pub(super) providers: Observable<Vec<ProviderHandle>>,
    registry_subs: Mutex<Vec<Subscription>>,
    provider_subs: Mutex<Vec<Subscription>>,
    torn_down: AtomicBool,
}

impl ProviderCollection {
    /// Subscribe to registry membership events and load the current snapshot.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        let inner = Arc::new(ProvidersInner {
            registry,
            providers: Observable::new(Vec::new()),
            registry_subs: Mutex::new(Vec::new()),
            provider_subs: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        });

        let subs = RegistryEvent::ALL
            .iter()
            .map(|&event| {
                let weak = Arc::downgrade(&inner);
                inner.registry.on(event, Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        tracing::debug!(event = event.as_str(), "providers: registry event");
                        inner.refresh();
                    }
                }))
            })
            .collect();
        *lock(&inner.registry_subs) = subs;
        inner.refresh();
        Self { inner }
    }

    pub fn current(&self) -> Arc<Vec<ProviderHandle>> { self.inner.providers.get() }

    pub fn len(&self) -> usize { self.current().len() }

    pub fn is_empty(&self) -> bool { self.current().is_empty() }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<ProviderHandle>>> { self.inner.providers.subscribe() }

    pub fn on_change(&self, listener: Listener) -> Subscription { self.inner.providers.on_change(listener) }

    pub fn is_torn_down(&self) -> bool { self.inner.is_torn_down() }

    /// Detach from the registry and every provider. Safe to call repeatedly.
    pub fn teardown(&self) { self.inner.teardown(); }
}

impl Drop for ProviderCollection {
    fn drop(&mut self) { self.inner.teardown(); }
}

impl ProvidersInner {
    fn is_torn_down(&self) -> bool { self.torn_down.load(Ordering::SeqCst) }

    fn refresh(self: &Arc<Self>) {
        if self.is_torn_down() {
            return;
        }
        let providers = self.registry.snapshot();
        self.resubscribe(&providers);
        tracing::debug!(count = providers.len(), "providers: refreshed");
        self.providers.set(providers);
    }

    fn resubscribe(self: &Arc<Self>, providers: &[ProviderHandle]) {
        let fresh: Vec<Subscription> = providers
            .iter()
            .filter_map(|provider| {
                let events = provider.features().events()?;
                let weak = Arc::downgrade(self);
                let name = provider.name().to_string();
                Some(events.on(ProviderEvent::Changed, Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.provider_changed(&name);
                    }
                })))
            })
            .collect();
        let stale = std::mem::replace(&mut *lock(&self.provider_subs), fresh);
        for sub in stale {
            sub.unsubscribe();
        }
        // teardown may have run while we were subscribing
        if self.is_torn_down() {
            let late: Vec<_> = lock(&self.provider_subs).drain(..).collect();
            for sub in late {
                sub.unsubscribe();
            }
        }
    }

    fn provider_changed(&self, name: &str) {
        if self.is_torn_down() {
            return;
        }
        tracing::debug!(provider = name, "providers: provider changed");
        self.providers.touch();
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let registry: Vec<_> = lock(&self.registry_subs).drain(..).collect();
        let providers: Vec<_> = lock(&self.provider_subs).drain(..).collect();
        tracing::debug!(registry = registry.len(), providers = providers.len(), "providers: teardown");
        for sub in registry.into_iter().chain(providers) {
            sub.unsubscribe();
        }
    }
}
