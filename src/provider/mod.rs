//! Provider handles and their capability objects.
//!
//! A provider is an external wallet implementation. This crate never owns one:
//! it receives [`ProviderHandle`]s from a [`Registry`](crate::registry::Registry)
//! and only ever looks at the name, icon, chains and the capability map.
//!
//! ```text
//! ProviderHandle (Arc<dyn Provider>)
//!     │
//!     └── features() → Features { name → Capability }
//!                          ├── "standard:connect"    → Capability::Connect
//!                          ├── "standard:disconnect" → Capability::Disconnect
//!                          ├── "standard:events"     → Capability::Events
//!                          └── "<vendor>:<method>"   → Capability::Method
//! ```

mod account;

pub use account::NativeAccount;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::names::{provider as events, standard};
use crate::core::{Listener, Subscription};
use crate::error::ProviderError;

/// Shared handle to a provider. Identity is the `Arc` allocation.
pub type ProviderHandle = Arc<dyn Provider>;

pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn icon(&self) -> &str;
    fn version(&self) -> &str { "1.0.0" }
    fn chains(&self) -> Vec<String>;
    fn features(&self) -> Features;
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}

/// Address of the provider allocation, used as an identity key.
pub fn provider_key(provider: &ProviderHandle) -> usize {
    Arc::as_ptr(provider) as *const () as usize
}

pub fn same_provider(a: &ProviderHandle, b: &ProviderHandle) -> bool {
    provider_key(a) == provider_key(b)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectInput {
    /// Reauthorize without prompting; providers may return no accounts.
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOutput {
    pub accounts: Vec<NativeAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
    Changed,
}

impl ProviderEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEvent::Changed => events::CHANGED,
        }
    }
}

#[async_trait]
pub trait ConnectCapability: Send + Sync {
    async fn connect(&self, input: ConnectInput) -> Result<ConnectOutput, ProviderError>;
}

#[async_trait]
pub trait DisconnectCapability: Send + Sync {
    async fn disconnect(&self) -> Result<(), ProviderError>;
}

pub trait EventsCapability: Send + Sync {
    fn on(&self, event: ProviderEvent, listener: Listener) -> Subscription;
}

/// Any provider-specific operation (signing, chain switching, ...).
#[async_trait]
pub trait MethodCapability: Send + Sync {
    async fn invoke(&self, input: Value) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub enum Capability {
    Connect(Arc<dyn ConnectCapability>),
    Disconnect(Arc<dyn DisconnectCapability>),
    Events(Arc<dyn EventsCapability>),
    Method(Arc<dyn MethodCapability>),
}

impl Capability {
    pub fn kind(&self) -> &'static str {
        match self {
            Capability::Connect(_) => "connect",
            Capability::Disconnect(_) => "disconnect",
            Capability::Events(_) => "events",
            Capability::Method(_) => "method",
        }
    }

    pub fn as_connect(&self) -> Option<Arc<dyn ConnectCapability>> {
        match self { Capability::Connect(c) => Some(c.clone()), _ => None }
    }

    pub fn as_disconnect(&self) -> Option<Arc<dyn DisconnectCapability>> {
        match self { Capability::Disconnect(c) => Some(c.clone()), _ => None }
    }

    pub fn as_events(&self) -> Option<Arc<dyn EventsCapability>> {
        match self { Capability::Events(c) => Some(c.clone()), _ => None }
    }

    pub fn as_method(&self) -> Option<Arc<dyn MethodCapability>> {
        match self { Capability::Method(c) => Some(c.clone()), _ => None }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability::{}", self.kind())
    }
}

/// Capability map declared by a provider, keyed by capability name.
#[derive(Debug, Clone, Default)]
pub struct Features(BTreeMap<String, Capability>);

impl Features {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.insert(name, capability);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, capability: Capability) {
        self.0.insert(name.into(), capability);
    }

    pub fn get(&self, name: &str) -> Option<&Capability> { self.0.get(name) }

    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    pub fn names(&self) -> Vec<String> { self.0.keys().cloned().collect() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// The change-notification capability, when declared with the right shape.
    pub fn events(&self) -> Option<Arc<dyn EventsCapability>> {
        self.get(standard::EVENTS).and_then(Capability::as_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl MethodCapability for Echo {
        async fn invoke(&self, input: Value) -> Result<Value, ProviderError> { Ok(input) }
    }

    #[test]
    fn features_report_declared_names_in_order() {
        let features = Features::new()
            .with("acme:sign", Capability::Method(Arc::new(Echo)))
            .with("acme:echo", Capability::Method(Arc::new(Echo)));
        assert_eq!(features.names(), vec!["acme:echo", "acme:sign"]);
        assert!(features.contains("acme:sign"));
        assert!(!features.contains(standard::CONNECT));
    }

    #[test]
    fn events_lookup_ignores_mismatched_shape() {
        let features = Features::new().with(standard::EVENTS, Capability::Method(Arc::new(Echo)));
        assert!(features.events().is_none());
        assert_eq!(features.get(standard::EVENTS).map(Capability::kind), Some("method"));
    }
}
