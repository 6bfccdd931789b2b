//! Connection configuration - passed from higher layers

use std::time::Duration;

pub const CONNECT_TIMEOUT_ENV: &str = "BEECONNECT_CONNECT_TIMEOUT_MS";
pub const DISCONNECT_TIMEOUT_ENV: &str = "BEECONNECT_DISCONNECT_TIMEOUT_MS";

/// Waits are unbounded unless a timeout is set. A timeout only bounds how long
/// the controller waits; the provider call itself keeps running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub connect_timeout: Option<Duration>,
    pub disconnect_timeout: Option<Duration>,
    /// Ask providers to reauthorize without prompting.
    pub silent: bool,
}

impl ConnectionConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self { self.connect_timeout = Some(timeout); self }
    pub fn with_disconnect_timeout(mut self, timeout: Duration) -> Self { self.disconnect_timeout = Some(timeout); self }
    pub fn silent(mut self) -> Self { self.silent = true; self }

    pub fn from_env() -> Self { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
        };
        Self { connect_timeout: millis(CONNECT_TIMEOUT_ENV), disconnect_timeout: millis(DISCONNECT_TIMEOUT_ENV), silent: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_parses_millis_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [(CONNECT_TIMEOUT_ENV, "1500"), (DISCONNECT_TIMEOUT_ENV, "soon")].into();
        let config = ConnectionConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.disconnect_timeout, None);
    }

    #[test]
    fn zero_means_unbounded() {
        let config = ConnectionConfig::from_lookup(|_| Some("0".into()));
        assert_eq!(config, ConnectionConfig::default());
    }
}
