//! Hub - one registry, one identity cache, any number of views onto them
//!
//! Collections and controllers handed out by the same hub share its
//! [`IdentityCache`], so a wallet seen through the public collection is the
//! same `Arc` a controller reports after connecting.

mod config;

pub use config::HubConfig;

use std::sync::Arc;

use crate::collection::{ProviderCollection, PublicCollection};
use crate::connection::ConnectionController;
use crate::identity::{IdentityCache, PublicHandle};
use crate::provider::ProviderHandle;
use crate::registry::Registry;

pub struct Hub {
    registry: Arc<dyn Registry>,
    cache: Arc<IdentityCache>,
    config: HubConfig,
}

impl Hub {
    pub fn new(registry: Arc<dyn Registry>) -> Self { Self::from_config(registry, HubConfig::default()) }

    pub fn from_config(registry: Arc<dyn Registry>, config: HubConfig) -> Self {
        tracing::debug!(app = %config.app, "hub: created");
        Self { registry, cache: Arc::new(IdentityCache::new()), config }
    }

    pub fn registry(&self) -> &Arc<dyn Registry> { &self.registry }
    pub fn cache(&self) -> &Arc<IdentityCache> { &self.cache }
    pub fn config(&self) -> &HubConfig { &self.config }

    /// Caller owns teardown.
    pub fn providers(&self) -> ProviderCollection { ProviderCollection::new(self.registry.clone()) }

    /// Caller owns teardown.
    pub fn wallets(&self) -> PublicCollection { PublicCollection::new(self.providers(), self.cache.clone()) }

    pub fn controller(&self) -> ConnectionController {
        ConnectionController::with_config(self.registry.clone(), self.cache.clone(), self.config.connection.clone())
    }

    pub fn public_handle(&self, provider: &ProviderHandle) -> PublicHandle { self.cache.derive_public_handle(provider) }
}
