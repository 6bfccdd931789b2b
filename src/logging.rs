use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "BEECONNECT_LOG_JSON";

/// Used when `RUST_LOG` is unset: this crate at info, everything else at warn.
pub const DEFAULT_FILTER: &str = "warn,beeconnect=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self { Self::from_value(std::env::var(LOG_JSON_ENV).ok().as_deref()) }

    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "1" || v == "true" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Install the global subscriber on stderr. Later calls are ignored.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match LogFormat::from_env() {
        LogFormat::Json => {
            let _ = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Compact => {
            let _ = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
