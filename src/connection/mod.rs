//! Connection controller: one session with one provider at a time.
//!
//! # State machine
//!
//! ```text
//!            connect()                    ok
//! Idle ───────────────▶ Connecting ─────────────▶ Connected
//!  ▲                        │  │                      │
//!  │    no connect cap.     │  │ err                  │ disconnect()
//!  └────────────────────────┘  ▼                      ▼
//!                            Error ◀──── err ──── (always clears wallet/account)
//! ```
//!
//! `connect` returns immediately while this controller is already Connecting.
//! Across controllers, concurrent connects to the same provider allocation share
//! one provider invocation through the process-wide in-flight table.
//!
//! Connecting through a [`PublicHandle`] re-resolves the provider by name in the
//! registry's current snapshot, since the handle may outlive the provider
//! instance it was derived from. Two providers sharing a name are
//! indistinguishable here; the first match wins.

mod config;
mod inflight;

pub use config::{ConnectionConfig, CONNECT_TIMEOUT_ENV, DISCONNECT_TIMEOUT_ENV};
pub use inflight::is_in_flight;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::names::standard;
use crate::error::{WalletError, WalletResult};
use crate::identity::{self, IdentityCache, PublicAccount, PublicHandle};
use crate::provider::{ConnectInput, ConnectOutput, ProviderHandle};
use crate::registry::Registry;
use inflight::Join;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

/// Snapshot of a controller. `provider`, `wallet` and `account` are only set
/// while Connected (or while a reconnect is Connecting).
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub provider: Option<ProviderHandle>,
    pub wallet: Option<PublicHandle>,
    pub account: Option<Arc<PublicAccount>>,
    pub accounts: Vec<Arc<PublicAccount>>,
    pub error: Option<WalletError>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    fn failed(error: WalletError) -> Self {
        Self { status: ConnectionStatus::Error, error: Some(error), ..Default::default() }
    }

    pub fn is_connected(&self) -> bool { self.status == ConnectionStatus::Connected }

    pub fn is_connecting(&self) -> bool { self.status == ConnectionStatus::Connecting }

    /// JSON view for logs and the CLI.
    pub fn summary(&self) -> Value {
        json!({
            "status": self.status.as_str(),
            "connected": self.is_connected(),
            "wallet": self.wallet.as_deref(),
            "account": self.account.as_deref(),
            "accounts": self.accounts.iter().map(|a| a.as_ref()).collect::<Vec<&PublicAccount>>(),
            "error": self.error.as_ref().map(|e| e.to_string()),
            "connected_at": self.connected_at.map(|t| t.to_rfc3339()),
        })
    }
}

/// What to connect to: a provider handle used as-is, or a public handle that
/// is re-resolved against the registry.
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    Provider(ProviderHandle),
    Wallet(PublicHandle),
}

impl From<ProviderHandle> for ConnectTarget {
    fn from(p: ProviderHandle) -> Self { ConnectTarget::Provider(p) }
}

impl From<&ProviderHandle> for ConnectTarget {
    fn from(p: &ProviderHandle) -> Self { ConnectTarget::Provider(p.clone()) }
}

impl From<PublicHandle> for ConnectTarget {
    fn from(w: PublicHandle) -> Self { ConnectTarget::Wallet(w) }
}

impl From<&PublicHandle> for ConnectTarget {
    fn from(w: &PublicHandle) -> Self { ConnectTarget::Wallet(w.clone()) }
}

#[derive(Clone)]
pub struct ConnectionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    registry: Arc<dyn Registry>,
    cache: Arc<IdentityCache>,
    config: ConnectionConfig,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionController {
    pub fn new(registry: Arc<dyn Registry>, cache: Arc<IdentityCache>) -> Self {
        Self::with_config(registry, cache, ConnectionConfig::default())
    }

    pub fn with_config(registry: Arc<dyn Registry>, cache: Arc<IdentityCache>, config: ConnectionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self { inner: Arc::new(ControllerInner { registry, cache, config, state }) }
    }

    pub fn state(&self) -> ConnectionState { self.inner.state.borrow().clone() }
    pub fn status(&self) -> ConnectionStatus { self.inner.state.borrow().status }
    pub fn is_connected(&self) -> bool { self.status() == ConnectionStatus::Connected }
    pub fn wallet(&self) -> Option<PublicHandle> { self.inner.state.borrow().wallet.clone() }
    pub fn account(&self) -> Option<Arc<PublicAccount>> { self.inner.state.borrow().account.clone() }
    pub fn error(&self) -> Option<WalletError> { self.inner.state.borrow().error.clone() }
    pub fn config(&self) -> &ConnectionConfig { &self.inner.config }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> { self.inner.state.subscribe() }

    pub async fn connect(&self, target: impl Into<ConnectTarget>) -> WalletResult<()> {
        let input = ConnectInput { silent: self.inner.config.silent };
        self.connect_with(target.into(), input).await
    }

    /// Reauthorize without prompting. Providers that never authorized this
    /// client typically connect with no accounts.
    pub async fn connect_silently(&self, target: impl Into<ConnectTarget>) -> WalletResult<()> {
        self.connect_with(target.into(), ConnectInput { silent: true }).await
    }

    async fn connect_with(&self, target: ConnectTarget, input: ConnectInput) -> WalletResult<()> {
        let began = self.inner.state.send_if_modified(|state| {
            if state.is_connecting() {
                return false;
            }
            state.status = ConnectionStatus::Connecting;
            state.error = None;
            true
        });
        if !began {
            tracing::debug!("connect: already connecting");
            return Ok(());
        }

        match self.establish(target, input).await {
            Ok(Some((provider, output))) => {
                let wallet = self.inner.cache.derive_public_handle(&provider);
                let accounts = self.inner.cache.derive_accounts(&wallet, &provider, &output.accounts);
                tracing::info!(wallet = wallet.name(), accounts = accounts.len(), "connect: connected");
                self.inner.state.send_replace(ConnectionState {
                    status: ConnectionStatus::Connected,
                    account: accounts.first().cloned(),
                    accounts,
                    wallet: Some(wallet),
                    provider: Some(provider),
                    error: None,
                    connected_at: Some(Utc::now()),
                });
                Ok(())
            }
            Ok(None) => {
                self.inner.state.send_replace(ConnectionState::default());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "connect: failed");
                self.inner.state.send_replace(ConnectionState::failed(e.clone()));
                Err(e)
            }
        }
    }

    async fn establish(&self, target: ConnectTarget, input: ConnectInput) -> WalletResult<Option<(ProviderHandle, ConnectOutput)>> {
        let provider = match target {
            ConnectTarget::Provider(provider) => provider,
            ConnectTarget::Wallet(wallet) => self.resolve(wallet.name())?,
        };
        let pending = match inflight::join_or_start(&provider, input)? {
            None => {
                tracing::debug!(provider = provider.name(), "connect: provider offers no connect capability");
                return Ok(None);
            }
            Some(Join::Adopted(pending)) => {
                tracing::debug!(provider = provider.name(), "connect: joining in-flight connect");
                pending
            }
            Some(Join::Started(pending)) => {
                tracing::info!(provider = provider.name(), silent = input.silent, "connect: invoking provider");
                pending
            }
        };
        let output = bounded(standard::CONNECT, self.inner.config.connect_timeout, pending).await?;
        Ok(Some((provider, output)))
    }

    /// Disconnect the current provider. Local state is cleared even when the
    /// provider's disconnect fails; the failure is then recorded and returned.
    pub async fn disconnect(&self) -> WalletResult<()> {
        let provider = self.inner.state.borrow().provider.clone();
        let Some(provider) = provider else {
            return Ok(());
        };

        // live feature map, same as connect
        let features = provider.features();
        let result = match features.get(standard::DISCONNECT) {
            None => Ok(()),
            Some(capability) => match capability.as_disconnect() {
                None => Err(WalletError::UnsupportedInvocation { capability: standard::DISCONNECT.into() }),
                Some(disconnect) => {
                    let call = async move {
                        disconnect.disconnect().await.map_err(|e| WalletError::invocation(standard::DISCONNECT, e))
                    };
                    bounded(standard::DISCONNECT, self.inner.config.disconnect_timeout, call).await
                }
            },
        };

        match result {
            Ok(()) => {
                tracing::info!(provider = provider.name(), "disconnect: done");
                self.inner.state.send_replace(ConnectionState::default());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "disconnect: provider failed, local state cleared");
                self.inner.state.send_replace(ConnectionState::failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Invoke a method capability on the connected wallet, re-resolving the
    /// provider from the registry first.
    pub async fn invoke(&self, capability: &str, input: Value) -> WalletResult<Value> {
        let wallet = self.wallet().ok_or(WalletError::NotConnected)?;
        let provider = self.resolve(wallet.name())?;
        let current = self.inner.cache.derive_public_handle(&provider);
        identity::invoke(&current, capability, input).await
    }

    fn resolve(&self, name: &str) -> WalletResult<ProviderHandle> {
        self.inner
            .registry
            .snapshot()
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| WalletError::provider_not_found(name))
    }
}

async fn bounded<T>(capability: &str, limit: Option<Duration>, call: impl Future<Output = WalletResult<T>>) -> WalletResult<T> {
    match limit {
        None => call.await,
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| WalletError::Timeout {
            capability: capability.to_string(),
            millis: limit.as_millis() as u64,
        })?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::NativeAccount;
    use crate::registry::{MemoryRegistry, ProviderDef, SimulatedProvider};

    fn setup(def: ProviderDef) -> (Arc<MemoryRegistry>, Arc<SimulatedProvider>, ConnectionController) {
        let registry = Arc::new(MemoryRegistry::new());
        let sim = Arc::new(SimulatedProvider::new(def));
        registry.register(sim.clone());
        let controller = ConnectionController::new(registry.clone(), Arc::new(IdentityCache::new()));
        (registry, sim, controller)
    }

    #[tokio::test]
    async fn connect_then_disconnect() {
        let (_registry, sim, controller) = setup(ProviderDef::new("Acme").with_account(NativeAccount::new("0xAB")));
        let handle: ProviderHandle = sim.clone();

        controller.connect(&handle).await.unwrap();
        let state = controller.state();
        assert!(state.is_connected());
        assert_eq!(state.account.as_ref().map(|a| a.address()), Some("0xAB"));
        assert!(state.connected_at.is_some());
        assert!(!is_in_flight(&handle));

        controller.disconnect().await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Idle);
        assert!(controller.wallet().is_none());
        assert_eq!(sim.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_noop() {
        let (_registry, sim, controller) = setup(ProviderDef::new("Acme"));
        controller.disconnect().await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Idle);
        assert_eq!(sim.disconnect_calls(), 0);
    }

    #[tokio::test]
    async fn missing_disconnect_capability_still_clears_state() {
        let (_registry, sim, controller) = setup(ProviderDef::new("Acme").without_feature(standard::DISCONNECT));
        let handle: ProviderHandle = sim.clone();
        controller.connect(handle).await.unwrap();
        controller.disconnect().await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Idle);
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn invoke_requires_connection() {
        let (_registry, _sim, controller) = setup(ProviderDef::new("Acme").with_feature("acme:sign"));
        let err = controller.invoke("acme:sign", json!({})).await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
    }

    #[test]
    fn summary_reports_status_and_error() {
        let state = ConnectionState::failed(WalletError::provider_not_found("Acme"));
        let summary = state.summary();
        assert_eq!(summary["status"], "error");
        assert_eq!(summary["connected"], false);
        assert_eq!(summary["error"], "provider not found: Acme");
        assert!(summary["wallet"].is_null());
    }
}
