//! Error taxonomy for provider lookup, capability access and connection.

use thiserror::Error;

pub type WalletResult<T> = Result<T, WalletError>;

/// Failure reported by a provider's own capability implementation.
///
/// Stored verbatim in [`WalletError::CapabilityInvocation`] and in the
/// controller's error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(mut self, code: i64) -> Self { self.code = Some(code); self }

    /// Conventional "user rejected the request" error.
    pub fn rejected() -> Self { Self::new("user rejected the request").with_code(4001) }
}

impl From<anyhow::Error> for ProviderError {
    fn from(e: anyhow::Error) -> Self { Self::new(e.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The capability is not declared by, or no longer present on, the provider.
    #[error("capability not found: {capability}")]
    CapabilityNotFound { capability: String },

    /// A public handle no longer matches any provider in the registry.
    #[error("provider not found: {name}")]
    ProviderNotFound { name: String },

    /// The provider's capability rejected.
    #[error("{capability} failed: {source}")]
    CapabilityInvocation {
        capability: String,
        #[source]
        source: ProviderError,
    },

    /// Only produced when a timeout is configured.
    #[error("{capability} timed out after {millis}ms")]
    Timeout { capability: String, millis: u64 },

    /// An operation needing a connected wallet ran while none was connected.
    #[error("no wallet connected")]
    NotConnected,

    /// The capability exists but cannot be invoked the way it was asked to.
    #[error("capability {capability} does not support this invocation")]
    UnsupportedInvocation { capability: String },
}

impl WalletError {
    pub fn capability_not_found(capability: impl Into<String>) -> Self {
        Self::CapabilityNotFound { capability: capability.into() }
    }

    pub fn provider_not_found(name: impl Into<String>) -> Self {
        Self::ProviderNotFound { name: name.into() }
    }

    pub fn invocation(capability: impl Into<String>, source: ProviderError) -> Self {
        Self::CapabilityInvocation { capability: capability.into(), source }
    }

    /// The provider-side cause, if this error wraps one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::CapabilityInvocation { source, .. } => Some(source),
            _ => None,
        }
    }
}
