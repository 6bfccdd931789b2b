//! External registry contract
//!
//! The registry is the source of truth for which providers exist. This crate
//! depends on exactly two operations: a synchronous snapshot and payload-free
//! membership notifications.
//!
//! ```text
//! Registry ── snapshot() ──────────────▶ Vec<ProviderHandle>
//!     │
//!     └── on(Registered | Unregistered) ─▶ listener() → caller re-reads snapshot()
//! ```
//!
//! [`MemoryRegistry`] is an in-process implementation; [`SimulatedProvider`]
//! is a scriptable provider for tests and the CLI.

mod fixture;
mod memory;
mod simulated;

pub use fixture::Fixture;
pub use memory::MemoryRegistry;
pub use simulated::{ProviderDef, SimulatedProvider};

use crate::core::names::registry as names;
use crate::core::{Listener, Subscription};
use crate::provider::ProviderHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryEvent {
    Registered,
    Unregistered,
}

impl RegistryEvent {
    pub const ALL: [RegistryEvent; 2] = [RegistryEvent::Registered, RegistryEvent::Unregistered];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryEvent::Registered => names::REGISTERED,
            RegistryEvent::Unregistered => names::UNREGISTERED,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            names::REGISTERED => Some(RegistryEvent::Registered),
            names::UNREGISTERED => Some(RegistryEvent::Unregistered),
            _ => None,
        }
    }
}

pub trait Registry: Send + Sync {
    /// Currently registered providers, in registration order.
    fn snapshot(&self) -> Vec<ProviderHandle>;

    /// Fire `listener` (no payload) whenever `event` occurs.
    fn on(&self, event: RegistryEvent, listener: Listener) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip() {
        for event in RegistryEvent::ALL {
            assert_eq!(RegistryEvent::from_str(event.as_str()), Some(event));
        }
        assert_eq!(RegistryEvent::from_str("changed"), None);
    }
}
