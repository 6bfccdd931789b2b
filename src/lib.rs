//! Beeconnect: wallet providers from a shared registry, stable handles, one connect at a time.
//!
//! # Architecture
//!
//! ```text
//! Registry (external: snapshot + registered/unregistered)
//!   │
//!   ├── ProviderCollection   (live Vec<ProviderHandle>, per-provider "changed")
//!   │     │
//!   │     └── IdentityCache ──▶ PublicCollection (live Vec<PublicHandle>)
//!   │
//!   └── ConnectionController (Idle → Connecting → Connected | Error)
//!         ├── in-flight table: one provider connect per provider allocation
//!         └── capability accessor → provider capability objects
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | list providers | `ProviderCollection::current()` | Registry snapshot, kept in sync |
//! | list wallets | `PublicCollection::current()` | Stable public handles |
//! | derive | `IdentityCache::derive_public_handle()` | Same provider → same `Arc` |
//! | capability | `identity::capability(wallet, name)` | Capability object or `CapabilityNotFound` |
//! | connect | `ConnectionController::connect(target)` | Single-flight per provider |
//! | disconnect | `ConnectionController::disconnect()` | Always clears local state |
//! | invoke | `ConnectionController::invoke(name, json)` | Named method on the connected wallet |
//!
//! # Usage
//!
//! ```ignore
//! use beeconnect::{Hub, MemoryRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MemoryRegistry::new());
//! let hub = Hub::new(registry);
//! let wallets = hub.wallets();
//! let controller = hub.controller();
//!
//! if let Some(acme) = wallets.find("Acme") {
//!     controller.connect(&acme).await?;
//! }
//! wallets.teardown();
//! ```

pub mod collection;
pub mod connection;
pub mod core;
pub mod error;
pub mod hub;
pub mod identity;
pub mod logging;
pub mod provider;
pub mod registry;

pub use collection::{ProviderCollection, PublicCollection};
pub use connection::{ConnectTarget, ConnectionConfig, ConnectionController, ConnectionState, ConnectionStatus};
pub use crate::core::{Listener, Observable, Subscription};
pub use error::{ProviderError, WalletError, WalletResult};
pub use hub::{Hub, HubConfig};
pub use identity::{IdentityCache, PublicAccount, PublicHandle, PublicWallet};
pub use provider::{Capability, ConnectInput, ConnectOutput, Features, NativeAccount, Provider, ProviderHandle};
pub use registry::{Fixture, MemoryRegistry, ProviderDef, Registry, RegistryEvent, SimulatedProvider};
