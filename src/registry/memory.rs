//! In-memory registry

use std::sync::Mutex;

use super::{Registry, RegistryEvent};
use crate::core::{lock, Listener, ListenerSet, Subscription};
use crate::provider::{same_provider, ProviderHandle};

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    providers: Mutex<Vec<ProviderHandle>>,
    registered: ListenerSet,
    unregistered: ListenerSet,
}

impl MemoryRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn with_providers(providers: impl IntoIterator<Item = ProviderHandle>) -> Self {
        Self { providers: Mutex::new(providers.into_iter().collect()), ..Default::default() }
    }

    /// Add `provider` and notify. Registering the same handle twice is a no-op.
    pub fn register(&self, provider: ProviderHandle) -> bool {
        {
            let mut providers = lock(&self.providers);
            if providers.iter().any(|p| same_provider(p, &provider)) {
                return false;
            }
            tracing::debug!(provider = provider.name(), "registry: registered");
            providers.push(provider);
        }
        self.registered.emit();
        true
    }

    pub fn unregister(&self, provider: &ProviderHandle) -> bool {
        let removed = {
            let mut providers = lock(&self.providers);
            let before = providers.len();
            providers.retain(|p| !same_provider(p, provider));
            providers.len() != before
        };
        if removed {
            tracing::debug!(provider = provider.name(), "registry: unregistered");
            self.unregistered.emit();
        }
        removed
    }

    pub fn unregister_named(&self, name: &str) -> Option<ProviderHandle> {
        let found = lock(&self.providers).iter().find(|p| p.name() == name).cloned()?;
        self.unregister(&found).then_some(found)
    }

    pub fn len(&self) -> usize { lock(&self.providers).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Attached membership listeners across both events.
    pub fn listener_count(&self) -> usize { self.registered.len() + self.unregistered.len() }
}

impl Registry for MemoryRegistry {
    fn snapshot(&self) -> Vec<ProviderHandle> { lock(&self.providers).clone() }

    fn on(&self, event: RegistryEvent, listener: Listener) -> Subscription {
        match event {
            RegistryEvent::Registered => self.registered.add(listener),
            RegistryEvent::Unregistered => self.unregistered.add(listener),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProviderDef, SimulatedProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn handle(name: &str) -> ProviderHandle { Arc::new(SimulatedProvider::new(ProviderDef::new(name))) }

    #[test]
    fn register_and_unregister_notify_separately() {
        let registry = MemoryRegistry::new();
        let joined = Arc::new(AtomicUsize::new(0));
        let left = Arc::new(AtomicUsize::new(0));
        let (j, l) = (joined.clone(), left.clone());
        let _a = registry.on(RegistryEvent::Registered, Arc::new(move || { j.fetch_add(1, Ordering::SeqCst); }));
        let _b = registry.on(RegistryEvent::Unregistered, Arc::new(move || { l.fetch_add(1, Ordering::SeqCst); }));

        let acme = handle("Acme");
        assert!(registry.register(acme.clone()));
        assert!(!registry.register(acme.clone()));
        assert!(registry.register(handle("Bolt")));
        assert!(registry.unregister(&acme));
        assert!(!registry.unregister(&acme));

        assert_eq!(joined.load(Ordering::SeqCst), 2);
        assert_eq!(left.load(Ordering::SeqCst), 1);
        let names: Vec<_> = registry.snapshot().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Bolt"]);
    }

    #[test]
    fn unregister_by_name_returns_removed_handle() {
        let registry = MemoryRegistry::with_providers(vec![handle("Acme")]);
        let removed = registry.unregister_named("Acme").expect("removed");
        assert_eq!(removed.name(), "Acme");
        assert!(registry.is_empty());
        assert!(registry.unregister_named("Acme").is_none());
    }
}
