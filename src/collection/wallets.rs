//! Public wallets derived from the provider collection.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::ProviderCollection;
use crate::core::{lock, Listener, Observable, Subscription};
use crate::identity::{IdentityCache, PublicHandle};
use crate::provider::ProviderHandle;

pub struct PublicCollection {
    providers: ProviderCollection,
    wallets: Arc<Observable<Vec<PublicHandle>>>,
    hook: Mutex<Option<Subscription>>,
}

fn derive(providers: &[ProviderHandle], cache: &IdentityCache) -> Vec<PublicHandle> {
    providers.iter().map(|p| cache.derive_public_handle(p)).collect()
}

impl PublicCollection {
    pub fn new(providers: ProviderCollection, cache: Arc<IdentityCache>) -> Self {
        let wallets = Arc::new(Observable::new(Vec::new()));

        let source = Arc::downgrade(&providers.inner);
        let target = Arc::downgrade(&wallets);
        let hook_cache = cache.clone();
        let hook = providers.on_change(Arc::new(move || {
            if let (Some(source), Some(target)) = (source.upgrade(), target.upgrade()) {
                target.set(derive(&source.providers.get(), &hook_cache));
            }
        }));
        wallets.set(derive(&providers.current(), &cache));

        Self { providers, wallets, hook: Mutex::new(Some(hook)) }
    }

    pub fn current(&self) -> Arc<Vec<PublicHandle>> { self.wallets.get() }

    pub fn find(&self, name: &str) -> Option<PublicHandle> {
        self.current().iter().find(|w| w.name() == name).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<PublicHandle>>> { self.wallets.subscribe() }

    pub fn on_change(&self, listener: Listener) -> Subscription { self.wallets.on_change(listener) }

    pub fn providers(&self) -> &ProviderCollection { &self.providers }

    /// Stop deriving and tear down the underlying provider collection.
    pub fn teardown(&self) {
        if let Some(hook) = lock(&self.hook).take() {
            hook.unsubscribe();
        }
        self.providers.teardown();
    }
}
