//! Hub configuration - passed from higher layers

use std::time::Duration;

use crate::connection::ConnectionConfig;

/// Hub configuration. Higher layers construct this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubConfig {
    pub app: String,
    pub connection: ConnectionConfig,
}

impl HubConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_connection(mut self, c: ConnectionConfig) -> Self { self.connection = c; self }
    pub fn with_connect_timeout(mut self, t: Duration) -> Self { self.connection.connect_timeout = Some(t); self }
    pub fn with_disconnect_timeout(mut self, t: Duration) -> Self { self.connection.disconnect_timeout = Some(t); self }
    pub fn silent(mut self) -> Self { self.connection.silent = true; self }

    /// Timeouts from `BEECONNECT_*_TIMEOUT_MS`.
    pub fn from_env(app: impl Into<String>) -> Self {
        Self { app: app.into(), connection: ConnectionConfig::from_env() }
    }
}
