//! Live provider and wallet collections
//!
//! ```text
//! Registry ── registered / unregistered ──▶ ProviderCollection::refresh()
//!                                               │  re-read snapshot()
//!                                               │  resubscribe per-provider "changed"
//!                                               ▼
//!                                  Observable<Vec<ProviderHandle>>
//!                                               │  on_change hook
//!                                               ▼
//!                      IdentityCache ──▶ Observable<Vec<PublicHandle>>  (PublicCollection)
//! ```
//!
//! Both collections must be torn down to detach their listeners. Teardown is
//! idempotent and also runs when the collection is dropped.

mod providers;
mod wallets;

pub use providers::ProviderCollection;
pub use wallets::PublicCollection;
