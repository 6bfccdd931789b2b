//! JSON fixtures describing a set of simulated providers.
//!
//! ```json
//! {
//!   "connect_timeout_ms": 5000,
//!   "providers": [
//!     { "name": "Acme", "chains": ["bitcoin:mainnet"], "accounts": [{ "address": "bc1q..." }] }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{MemoryRegistry, ProviderDef, SimulatedProvider};
use crate::provider::NativeAccount;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub providers: Vec<ProviderDef>,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("fixture read: {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("fixture json: {}", path.display()))
    }

    /// Two providers: one that connects, one that has no connect capability.
    pub fn demo() -> Self {
        Self {
            connect_timeout_ms: None,
            providers: vec![
                ProviderDef::new("Acme")
                    .with_chains(&["bitcoin:mainnet"])
                    .with_account(NativeAccount::new("bc1qacme0000000000000000000000000000000000").with_label("primary"))
                    .with_feature("acme:signMessage"),
                ProviderDef::new("Lookout")
                    .with_chains(&["bitcoin:mainnet"])
                    .without_feature(crate::core::names::standard::CONNECT),
            ],
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Register every provider, in fixture order.
    pub fn into_registry(self) -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        for def in self.providers {
            registry.register(Arc::new(SimulatedProvider::new(def)));
        }
        registry
    }
}
