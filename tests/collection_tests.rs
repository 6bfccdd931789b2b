//! Collection Tests: registry sync, change notifications, teardown
//!
//! These tests verify:
//! 1. Provider collection equals the registry snapshot after every membership event
//! 2. A provider "changed" notification republishes the same members under a new sequence
//! 3. Async observers see membership and change notifications
//! 4. Teardown is idempotent and detaches every listener
//! 5. Public handles stay stable across churn, but not across provider instances

use beeconnect::{Hub, MemoryRegistry, ProviderDef, ProviderHandle, Registry, SimulatedProvider};
use beeconnect::provider::same_provider;
use std::sync::Arc;

fn sim(name: &str) -> Arc<SimulatedProvider> { Arc::new(SimulatedProvider::new(ProviderDef::new(name))) }

fn names(providers: &[ProviderHandle]) -> Vec<String> { providers.iter().map(|p| p.name().to_string()).collect() }

fn same_members(a: &[ProviderHandle], b: &[ProviderHandle]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_provider(x, y))
}

/// Test 1: collection mirrors the registry after each event
#[test]
fn collection_tracks_registry_snapshot() {
    let registry = Arc::new(MemoryRegistry::new());
    let hub = Hub::new(registry.clone());
    let collection = hub.providers();
    assert!(collection.is_empty());

    let (acme, bolt, cove) = (sim("Acme"), sim("Bolt"), sim("Cove"));
    let acme_handle: ProviderHandle = acme.clone();
    let bolt_handle: ProviderHandle = bolt.clone();

    registry.register(acme.clone());
    assert!(same_members(&collection.current(), &registry.snapshot()));

    registry.register(bolt.clone());
    registry.register(cove.clone());
    assert!(same_members(&collection.current(), &registry.snapshot()));
    assert_eq!(names(&collection.current()), vec!["Acme", "Bolt", "Cove"]);

    registry.unregister(&bolt_handle);
    assert!(same_members(&collection.current(), &registry.snapshot()));

    registry.unregister(&acme_handle);
    registry.register(acme.clone());
    assert!(same_members(&collection.current(), &registry.snapshot()));
    assert_eq!(names(&collection.current()), vec!["Cove", "Acme"]);

    collection.teardown();
}

/// Test 2: "changed" swaps the sequence reference, keeps membership
#[test]
fn provider_change_republishes_sequence() {
    let registry = Arc::new(MemoryRegistry::new());
    let acme = sim("Acme");
    registry.register(acme.clone());
    let collection = Hub::new(registry.clone()).providers();

    let before = collection.current();
    acme.emit_change();
    let after = collection.current();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(names(&before), names(&after));
    assert!(same_members(&before, &after));
}

/// Test 3: async receivers are notified
#[tokio::test]
async fn observers_receive_notifications() {
    let registry = Arc::new(MemoryRegistry::new());
    let collection = Hub::new(registry.clone()).providers();
    let mut rx = collection.subscribe();

    let acme = sim("Acme");
    registry.register(acme.clone());
    rx.changed().await.expect("membership change");
    assert_eq!(names(&rx.borrow_and_update()), vec!["Acme"]);

    acme.set_accounts(vec![beeconnect::NativeAccount::new("0xAB")]);
    rx.changed().await.expect("provider change");
    assert_eq!(names(&rx.borrow_and_update()), vec!["Acme"]);
}

/// Test 4: teardown detaches from registry and providers, twice is fine
#[test]
fn teardown_is_idempotent_and_complete() {
    let registry = Arc::new(MemoryRegistry::new());
    let (acme, bolt) = (sim("Acme"), sim("Bolt"));
    registry.register(acme.clone());
    registry.register(bolt.clone());

    let hub = Hub::new(registry.clone());
    let wallets = hub.wallets();
    assert_eq!(registry.listener_count(), 2);
    assert_eq!(acme.change_listeners(), 1);

    wallets.teardown();
    wallets.teardown();

    assert_eq!(registry.listener_count(), 0);
    assert_eq!(acme.change_listeners(), 0);
    assert_eq!(bolt.change_listeners(), 0);

    let frozen = wallets.current();
    registry.register(sim("Cove"));
    acme.emit_change();
    assert!(Arc::ptr_eq(&frozen, &wallets.current()));
    assert_eq!(wallets.current().len(), 2);
}

/// Test 5: identity holds per instance, not per name
#[test]
fn public_handles_follow_provider_instances() {
    let registry = Arc::new(MemoryRegistry::new());
    let acme = sim("Acme");
    registry.register(acme.clone());
    let hub = Hub::new(registry.clone());
    let wallets = hub.wallets();

    let first = wallets.find("Acme").expect("acme");
    registry.register(sim("Bolt"));
    acme.emit_change();
    assert!(Arc::ptr_eq(&first, &wallets.find("Acme").expect("acme")));

    let old: ProviderHandle = acme.clone();
    registry.unregister(&old);
    registry.register(sim("Acme"));
    let replaced = wallets.find("Acme").expect("new acme");
    assert!(!Arc::ptr_eq(&first, &replaced));
    assert_eq!(first.name(), replaced.name());

    wallets.teardown();
}
