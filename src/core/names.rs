//! Well-known capability and event names
//!
//! Centralized so providers, the registry and the controller agree on spelling.

/// Standard capabilities
pub mod standard {
    pub const CONNECT: &str = "standard:connect";
    pub const DISCONNECT: &str = "standard:disconnect";
    pub const EVENTS: &str = "standard:events";

    pub const ALL: &[&str] = &[CONNECT, DISCONNECT, EVENTS];
}

/// Registry membership events
pub mod registry {
    pub const REGISTERED: &str = "registered";
    pub const UNREGISTERED: &str = "unregistered";
}

/// Provider-level events
pub mod provider {
    pub const CHANGED: &str = "changed";
}
