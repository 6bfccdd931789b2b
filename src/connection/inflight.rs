//! Process-wide single-flight table for connect invocations.
//!
//! Keyed by provider allocation. Each entry holds the provider weakly and is
//! removed by the operation itself when it settles, never earlier.

use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::core::lock;
use crate::core::names::standard;
use crate::error::{WalletError, WalletResult};
use crate::provider::{provider_key, same_provider, ConnectInput, ConnectOutput, Provider, ProviderHandle};

pub(crate) type PendingConnect = Shared<BoxFuture<'static, WalletResult<ConnectOutput>>>;

struct InFlight {
    op: u64,
    provider: Weak<dyn Provider>,
    pending: PendingConnect,
}

static TABLE: Lazy<Mutex<HashMap<usize, InFlight>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_OP: AtomicU64 = AtomicU64::new(1);

pub(crate) enum Join {
    /// Another caller already started this provider's connect.
    Adopted(PendingConnect),
    Started(PendingConnect),
}

fn existing(table: &HashMap<usize, InFlight>, provider: &ProviderHandle) -> Option<PendingConnect> {
    let entry = table.get(&provider_key(provider))?;
    let alive = entry.provider.upgrade()?;
    same_provider(&alive, provider).then(|| entry.pending.clone())
}

/// Join the pending connect for `provider` or start one.
///
/// `Ok(None)` when the provider declares no connect capability. The provider's
/// live feature map is read rather than a [`PublicWallet`](crate::identity::PublicWallet),
/// whose capability list is fixed at first derivation.
pub(crate) fn join_or_start(provider: &ProviderHandle, input: ConnectInput) -> WalletResult<Option<Join>> {
    if let Some(pending) = existing(&lock(&TABLE), provider) {
        return Ok(Some(Join::Adopted(pending)));
    }

    let features = provider.features();
    let Some(capability) = features.get(standard::CONNECT) else {
        return Ok(None);
    };
    let connect = capability
        .as_connect()
        .ok_or_else(|| WalletError::UnsupportedInvocation { capability: standard::CONNECT.into() })?;

    let key = provider_key(provider);
    let op = NEXT_OP.fetch_add(1, Ordering::SeqCst);
    let pending = async move {
        let result = connect.connect(input).await.map_err(|e| WalletError::invocation(standard::CONNECT, e));
        settle(key, op);
        result
    }
    .boxed()
    .shared();

    {
        let mut table = lock(&TABLE);
        // lost a race while the table was unlocked
        if let Some(winner) = existing(&table, provider) {
            return Ok(Some(Join::Adopted(winner)));
        }
        table.insert(key, InFlight { op, provider: Arc::downgrade(provider), pending: pending.clone() });
    }

    // Drive to completion even if every caller stops waiting.
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        runtime.spawn(pending.clone());
    }
    Ok(Some(Join::Started(pending)))
}

fn settle(key: usize, op: u64) {
    let mut table = lock(&TABLE);
    if table.get(&key).map_or(false, |entry| entry.op == op) {
        table.remove(&key);
    }
}

/// Whether a connect for this provider is currently pending.
pub fn is_in_flight(provider: &ProviderHandle) -> bool {
    existing(&lock(&TABLE), provider).is_some()
}
