//! Identity cache: provider handles → stable public handles
//!
//! Observers compare wallets and accounts by reference, so the same provider
//! allocation must always map to the same [`PublicWallet`] allocation.
//!
//! ```text
//! ProviderHandle ──derive_public_handle──▶ PublicHandle (Arc<PublicWallet>)
//!      ▲                                        │
//!      └──────────── weak back-reference ───────┘
//!
//! (PublicHandle, NativeAccount) ──derive_accounts──▶ Arc<PublicAccount>
//! ```
//!
//! Entries hold the provider weakly, so the cache never keeps a provider the
//! registry has dropped alive. Dead entries are pruned on the next miss.

mod capability;

pub use capability::{capability, invoke};

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::core::lock;
use crate::provider::{provider_key, same_provider, NativeAccount, Provider, ProviderHandle};

pub type PublicHandle = Arc<PublicWallet>;

/// Consumer-facing view of a provider. Capability objects are not exposed;
/// only their names. Use [`capability`] to reach one.
///
/// Name, icon, chains and the capability list are captured when the handle is
/// first derived and never refreshed: the same provider keeps the same handle
/// after a `changed` notification. A capability the provider gained later is
/// therefore reported as `CapabilityNotFound` by [`capability`]; one it lost
/// is reported the same way at lookup time.
#[derive(Serialize)]
pub struct PublicWallet {
    name: String,
    icon: String,
    version: String,
    chains: Vec<String>,
    features: Vec<String>,
    #[serde(skip)]
    provider: Weak<dyn Provider>,
}

impl PublicWallet {
    fn from_provider(provider: &ProviderHandle) -> Self {
        Self {
            name: provider.name().to_string(),
            icon: provider.icon().to_string(),
            version: provider.version().to_string(),
            chains: provider.chains(),
            features: provider.features().names(),
            provider: Arc::downgrade(provider),
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn icon(&self) -> &str { &self.icon }
    pub fn version(&self) -> &str { &self.version }
    pub fn chains(&self) -> &[String] { &self.chains }
    pub fn features(&self) -> &[String] { &self.features }
    pub fn supports(&self, capability: &str) -> bool { self.features.iter().any(|f| f == capability) }

    pub(crate) fn provider(&self) -> Option<ProviderHandle> { self.provider.upgrade() }
}

impl fmt::Debug for PublicWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicWallet")
            .field("name", &self.name)
            .field("chains", &self.chains)
            .field("features", &self.features)
            .finish()
    }
}

/// Consumer-facing view of one authorized account.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    address: String,
    #[serde(serialize_with = "hex_key")]
    public_key: Vec<u8>,
    chains: Vec<String>,
    features: Vec<String>,
    label: Option<String>,
    wallet: String,
}

impl PublicAccount {
    pub fn address(&self) -> &str { &self.address }
    pub fn public_key(&self) -> &[u8] { &self.public_key }
    pub fn public_key_hex(&self) -> String { hex::encode(&self.public_key) }
    pub fn chains(&self) -> &[String] { &self.chains }
    pub fn features(&self) -> &[String] { &self.features }
    pub fn label(&self) -> Option<&str> { self.label.as_deref() }
    /// Name of the owning wallet.
    pub fn wallet(&self) -> &str { &self.wallet }
}

fn hex_key<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> { s.serialize_str(&hex::encode(bytes)) }

struct WalletEntry {
    provider: Weak<dyn Provider>,
    public: PublicHandle,
}

impl WalletEntry {
    fn is_for(&self, provider: &ProviderHandle) -> bool {
        self.provider.upgrade().map_or(false, |p| same_provider(&p, provider))
    }
}

struct AccountEntry {
    wallet: Weak<PublicWallet>,
    native: NativeAccount,
    public: Arc<PublicAccount>,
}

type AccountKey = (usize, String);

#[derive(Default)]
pub struct IdentityCache {
    wallets: Mutex<HashMap<usize, WalletEntry>>,
    accounts: Mutex<HashMap<AccountKey, AccountEntry>>,
}

impl IdentityCache {
    pub fn new() -> Self { Self::default() }

    /// Public handle for this exact provider allocation, created on first sight.
    pub fn derive_public_handle(&self, provider: &ProviderHandle) -> PublicHandle {
        let key = provider_key(provider);
        let mut wallets = lock(&self.wallets);
        if let Some(entry) = wallets.get(&key) {
            if entry.is_for(provider) {
                return entry.public.clone();
            }
        }
        wallets.retain(|_, entry| entry.provider.strong_count() > 0);
        let public = Arc::new(PublicWallet::from_provider(provider));
        tracing::debug!(wallet = public.name(), "identity: new public handle");
        wallets.insert(key, WalletEntry { provider: Arc::downgrade(provider), public: public.clone() });
        public
    }

    /// Public accounts for `native`, reusing earlier derivations for the same
    /// wallet and unchanged account. Accounts without chains inherit the
    /// provider's chains.
    pub fn derive_accounts(&self, public: &PublicHandle, provider: &ProviderHandle, native: &[NativeAccount]) -> Vec<Arc<PublicAccount>> {
        let wallet_key = Arc::as_ptr(public) as usize;
        let mut accounts = lock(&self.accounts);
        accounts.retain(|_, entry| entry.wallet.strong_count() > 0);

        native
            .iter()
            .map(|account| {
                let key = (wallet_key, account.address.clone());
                if let Some(entry) = accounts.get(&key) {
                    let same_wallet = entry.wallet.upgrade().map_or(false, |w| Arc::ptr_eq(&w, public));
                    if same_wallet && entry.native == *account {
                        return entry.public.clone();
                    }
                }
                let chains = if account.chains.is_empty() { provider.chains() } else { account.chains.clone() };
                let derived = Arc::new(PublicAccount {
                    address: account.address.clone(),
                    public_key: account.public_key.clone(),
                    chains,
                    features: account.features.clone(),
                    label: account.label.clone(),
                    wallet: public.name().to_string(),
                });
                accounts.insert(key, AccountEntry { wallet: Arc::downgrade(public), native: account.clone(), public: derived.clone() });
                derived
            })
            .collect()
    }

    /// Live wallet entries.
    pub fn len(&self) -> usize {
        lock(&self.wallets).values().filter(|e| e.provider.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache").field("wallets", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProviderDef, SimulatedProvider};

    fn acme() -> ProviderHandle {
        Arc::new(SimulatedProvider::new(ProviderDef::new("Acme").with_chains(&["bitcoin:mainnet"])))
    }

    #[test]
    fn same_provider_same_public_handle() {
        let cache = IdentityCache::new();
        let provider = acme();
        let a = cache.derive_public_handle(&provider);
        let b = cache.derive_public_handle(&provider);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "Acme");
        assert_eq!(a.chains(), ["bitcoin:mainnet".to_string()]);
        assert!(a.supports("standard:connect"));
    }

    #[test]
    fn distinct_instances_get_distinct_handles() {
        let cache = IdentityCache::new();
        let (first, second) = (acme(), acme());
        let a = cache.derive_public_handle(&first);
        let b = cache.derive_public_handle(&second);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), b.name());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_does_not_keep_providers_alive() {
        let cache = IdentityCache::new();
        let provider = acme();
        let public = cache.derive_public_handle(&provider);
        assert!(public.provider().is_some());
        drop(provider);
        assert!(public.provider().is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn accounts_are_identity_stable_until_they_change() {
        let cache = IdentityCache::new();
        let provider = acme();
        let public = cache.derive_public_handle(&provider);
        let native = vec![NativeAccount::new("0xAB"), NativeAccount::new("0xCD").with_chains(vec!["bitcoin:testnet".into()])];

        let first = cache.derive_accounts(&public, &provider, &native);
        let again = cache.derive_accounts(&public, &provider, &native);
        assert!(Arc::ptr_eq(&first[0], &again[0]));
        assert!(Arc::ptr_eq(&first[1], &again[1]));
        assert_eq!(first[0].chains(), ["bitcoin:mainnet".to_string()]);
        assert_eq!(first[1].chains(), ["bitcoin:testnet".to_string()]);
        assert_eq!(first[0].wallet(), "Acme");

        let relabeled = vec![NativeAccount::new("0xAB").with_label("savings")];
        let changed = cache.derive_accounts(&public, &provider, &relabeled);
        assert!(!Arc::ptr_eq(&first[0], &changed[0]));
        assert_eq!(changed[0].label(), Some("savings"));
    }
}
