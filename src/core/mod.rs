//! Shared building blocks: capability names, subscriptions, observable values.

pub mod names;
pub mod observable;
pub mod subscription;

pub use observable::Observable;
pub use subscription::{Listener, ListenerSet, Subscription};
pub(crate) use subscription::lock;
