//! Scriptable provider used by tests and the CLI harness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::names::standard;
use crate::core::{lock, Listener, ListenerSet, Subscription};
use crate::error::ProviderError;
use crate::provider::{
    Capability, ConnectCapability, ConnectInput, ConnectOutput, DisconnectCapability, EventsCapability, Features,
    MethodCapability, NativeAccount, Provider, ProviderEvent,
};

fn default_features() -> Vec<String> { standard::ALL.iter().map(|s| s.to_string()).collect() }

/// Declarative description of a simulated provider (also the CLI fixture format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDef {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<NativeAccount>,
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    #[serde(default)]
    pub connect_error: Option<String>,
    #[serde(default)]
    pub disconnect_error: Option<String>,
    #[serde(default)]
    pub delay_ms: u64,
}

impl ProviderDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: String::new(),
            chains: Vec::new(),
            accounts: Vec::new(),
            features: default_features(),
            connect_error: None,
            disconnect_error: None,
            delay_ms: 0,
        }
    }
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self { self.icon = icon.into(); self }
    pub fn with_chains(mut self, chains: &[&str]) -> Self { self.chains = chains.iter().map(|c| c.to_string()).collect(); self }
    pub fn with_account(mut self, account: NativeAccount) -> Self { self.accounts.push(account); self }
    pub fn with_feature(mut self, name: impl Into<String>) -> Self { self.features.push(name.into()); self }
    pub fn without_feature(mut self, name: &str) -> Self { self.features.retain(|f| f != name); self }
    pub fn with_delay(mut self, millis: u64) -> Self { self.delay_ms = millis; self }
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self { self.connect_error = Some(message.into()); self }
    pub fn failing_disconnect(mut self, message: impl Into<String>) -> Self { self.disconnect_error = Some(message.into()); self }
}

struct SimState {
    name: String,
    accounts: Mutex<Vec<NativeAccount>>,
    authorized: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    connect_error: Mutex<Option<ProviderError>>,
    disconnect_error: Mutex<Option<ProviderError>>,
    delay: Duration,
    changed: ListenerSet,
}

pub struct SimulatedProvider {
    def: ProviderDef,
    state: Arc<SimState>,
}

impl SimulatedProvider {
    pub fn new(def: ProviderDef) -> Self {
        let state = Arc::new(SimState {
            name: def.name.clone(),
            accounts: Mutex::new(def.accounts.clone()),
            authorized: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            connect_error: Mutex::new(def.connect_error.clone().map(ProviderError::new)),
            disconnect_error: Mutex::new(def.disconnect_error.clone().map(ProviderError::new)),
            delay: Duration::from_millis(def.delay_ms),
            changed: ListenerSet::new(),
        });
        Self { def, state }
    }

    pub fn def(&self) -> &ProviderDef { &self.def }

    pub fn connect_calls(&self) -> usize { self.state.connect_calls.load(Ordering::SeqCst) }

    pub fn disconnect_calls(&self) -> usize { self.state.disconnect_calls.load(Ordering::SeqCst) }

    pub fn is_authorized(&self) -> bool { self.state.authorized.load(Ordering::SeqCst) }

    pub fn change_listeners(&self) -> usize { self.state.changed.len() }

    pub fn fail_connect(&self, error: Option<ProviderError>) { *lock(&self.state.connect_error) = error; }

    pub fn fail_disconnect(&self, error: Option<ProviderError>) { *lock(&self.state.disconnect_error) = error; }

    /// Replace the account list and announce the change.
    pub fn set_accounts(&self, accounts: Vec<NativeAccount>) {
        *lock(&self.state.accounts) = accounts;
        self.emit_change();
    }

    pub fn emit_change(&self) { self.state.changed.emit(); }
}

impl Provider for SimulatedProvider {
    fn name(&self) -> &str { &self.def.name }

    fn icon(&self) -> &str { &self.def.icon }

    fn chains(&self) -> Vec<String> { self.def.chains.clone() }

    fn features(&self) -> Features {
        let mut features = Features::new();
        for name in &self.def.features {
            let capability = match name.as_str() {
                standard::CONNECT => Capability::Connect(Arc::new(SimConnect(self.state.clone()))),
                standard::DISCONNECT => Capability::Disconnect(Arc::new(SimDisconnect(self.state.clone()))),
                standard::EVENTS => Capability::Events(Arc::new(SimEvents(self.state.clone()))),
                other => Capability::Method(Arc::new(SimMethod { name: other.to_string(), state: self.state.clone() })),
            };
            features.insert(name.clone(), capability);
        }
        features
    }
}

struct SimConnect(Arc<SimState>);

#[async_trait]
impl ConnectCapability for SimConnect {
    async fn connect(&self, input: ConnectInput) -> Result<ConnectOutput, ProviderError> {
        let state = &self.0;
        state.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        if let Some(err) = lock(&state.connect_error).clone() {
            return Err(err);
        }
        if input.silent && !state.authorized.load(Ordering::SeqCst) {
            return Ok(ConnectOutput::default());
        }
        state.authorized.store(true, Ordering::SeqCst);
        Ok(ConnectOutput { accounts: lock(&state.accounts).clone() })
    }
}

struct SimDisconnect(Arc<SimState>);

#[async_trait]
impl DisconnectCapability for SimDisconnect {
    async fn disconnect(&self) -> Result<(), ProviderError> {
        let state = &self.0;
        state.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        state.authorized.store(false, Ordering::SeqCst);
        match lock(&state.disconnect_error).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct SimEvents(Arc<SimState>);

impl EventsCapability for SimEvents {
    fn on(&self, event: ProviderEvent, listener: Listener) -> Subscription {
        match event {
            ProviderEvent::Changed => self.0.changed.add(listener),
        }
    }
}

struct SimMethod {
    name: String,
    state: Arc<SimState>,
}

#[async_trait]
impl MethodCapability for SimMethod {
    async fn invoke(&self, input: Value) -> Result<Value, ProviderError> {
        if !self.state.authorized.load(Ordering::SeqCst) {
            return Err(ProviderError::new("not connected").with_code(4100));
        }
        Ok(json!({
            "provider": self.state.name,
            "capability": self.name,
            "input": input,
        }))
    }
}
