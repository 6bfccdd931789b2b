//! Capability accessor: public handle + name → capability object.

use serde_json::Value;

use super::PublicWallet;
use crate::error::{WalletError, WalletResult};
use crate::provider::Capability;

/// Look up `name` on the provider behind `wallet`.
///
/// Fails with `CapabilityNotFound` when the wallet never declared `name`, when
/// the provider has since been dropped, or when it no longer carries `name`.
pub fn capability(wallet: &PublicWallet, name: &str) -> WalletResult<Capability> {
    if !wallet.supports(name) {
        return Err(WalletError::capability_not_found(name));
    }
    let provider = wallet.provider().ok_or_else(|| WalletError::capability_not_found(name))?;
    provider.features().get(name).cloned().ok_or_else(|| WalletError::capability_not_found(name))
}

/// Invoke a method-style capability with a JSON payload.
pub async fn invoke(wallet: &PublicWallet, name: &str, input: Value) -> WalletResult<Value> {
    let method = capability(wallet, name)?
        .as_method()
        .ok_or_else(|| WalletError::UnsupportedInvocation { capability: name.to_string() })?;
    method.invoke(input).await.map_err(|e| WalletError::invocation(name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::names::standard;
    use crate::identity::IdentityCache;
    use crate::provider::ProviderHandle;
    use crate::registry::{ProviderDef, SimulatedProvider};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn undeclared_capability_is_not_found() {
        let cache = IdentityCache::new();
        let provider: ProviderHandle = Arc::new(SimulatedProvider::new(ProviderDef::new("Acme").without_feature(standard::DISCONNECT)));
        let public = cache.derive_public_handle(&provider);

        assert_eq!(capability(&public, standard::CONNECT).map(|c| c.kind()), Ok("connect"));
        assert_eq!(
            capability(&public, standard::DISCONNECT).unwrap_err(),
            WalletError::capability_not_found(standard::DISCONNECT)
        );
    }

    #[test]
    fn dropped_provider_is_a_consistency_failure() {
        let cache = IdentityCache::new();
        let provider: ProviderHandle = Arc::new(SimulatedProvider::new(ProviderDef::new("Acme")));
        let public = cache.derive_public_handle(&provider);
        drop(provider);
        assert!(matches!(capability(&public, standard::CONNECT), Err(WalletError::CapabilityNotFound { .. })));
    }

    #[tokio::test]
    async fn invoke_rejects_non_method_capabilities() {
        let cache = IdentityCache::new();
        let sim = Arc::new(SimulatedProvider::new(ProviderDef::new("Acme").with_feature("acme:sign")));
        let provider: ProviderHandle = sim.clone();
        let public = cache.derive_public_handle(&provider);

        let err = invoke(&public, standard::CONNECT, json!({})).await.unwrap_err();
        assert_eq!(err, WalletError::UnsupportedInvocation { capability: standard::CONNECT.into() });

        let err = invoke(&public, "acme:sign", json!({})).await.unwrap_err();
        assert_eq!(err.provider_error().and_then(|e| e.code), Some(4100));
    }
}
