//! Pure start/skip decision for one storage backend.

use super::{
    BackendConfig, BackendName, ConfigurationError, GatewayUrl, RunContext, StorageDomainError,
};
use std::fmt;

const PROVIDER_KEYS: [&str; 2] = ["storage.upload.provider", "storage.dappConnection"];
const ENDPOINT_KEYS: [&str; 2] = ["storage.upload.host", "storage.gatewayUrl"];
const GATEWAY_URL_KEYS: [&str; 1] = ["storage.gatewayUrl"];
const PORT_KEYS: [&str; 1] = ["storage.upload.port"];

/// Why a backend was deliberately switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisabledReason {
    /// Storage is disabled and no run context requires it.
    NotEnabled,
    /// The backend is not among the available providers.
    NotAvailable,
}

impl DisabledReason {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEnabled => "not_enabled",
            Self::NotAvailable => "not_available",
        }
    }
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of [`ConfigGate::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The backend is switched off on purpose.
    Disabled(DisabledReason),
    /// The backend is wanted but misconfigured.
    NotStarted(ConfigurationError),
    /// The backend may start against the resolved gateway.
    Proceed(GatewayUrl),
}

impl GateDecision {
    /// Returns whether the backend may start.
    #[must_use]
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed(_))
    }

    /// Returns the resolved gateway when the backend may start.
    #[must_use]
    pub const fn gateway(&self) -> Option<&GatewayUrl> {
        match self {
            Self::Proceed(url) => Some(url),
            Self::Disabled(_) | Self::NotStarted(_) => None,
        }
    }
}

/// Decides whether a backend starts, given the validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigGate {
    backend: BackendName,
    contexts: Vec<RunContext>,
}

impl ConfigGate {
    /// Creates a gate for `backend` running under `contexts`.
    #[must_use]
    pub fn new(backend: BackendName, contexts: impl IntoIterator<Item = RunContext>) -> Self {
        Self {
            backend,
            contexts: contexts.into_iter().collect(),
        }
    }

    /// Returns the backend this gate decides for.
    #[must_use]
    pub const fn backend(&self) -> &BackendName {
        &self.backend
    }

    /// Returns whether configuration or an upload run requires storage.
    #[must_use]
    pub fn is_effectively_enabled(&self, config: &BackendConfig) -> bool {
        config.enabled() || self.contexts.contains(&RunContext::Upload)
    }

    /// Evaluates `config`.
    #[must_use]
    pub fn decide(&self, config: &BackendConfig) -> GateDecision {
        if !self.is_effectively_enabled(config) {
            return GateDecision::Disabled(DisabledReason::NotEnabled);
        }

        let name = self.backend.as_str();
        if !config.is_available_provider(name) {
            return GateDecision::Disabled(DisabledReason::NotAvailable);
        }

        if !config.designates(name) {
            return GateDecision::NotStarted(self.unresolvable(&PROVIDER_KEYS));
        }

        match GatewayUrl::derive(config) {
            Ok(url) => GateDecision::Proceed(url),
            Err(err) => GateDecision::NotStarted(self.unresolvable(endpoint_keys(&err))),
        }
    }

    fn unresolvable(&self, keys: &[&str]) -> ConfigurationError {
        ConfigurationError::UnresolvableGateway {
            backend: self.backend.clone(),
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
        }
    }
}

/// Maps a failed gateway derivation to the keys that would fix it.
fn endpoint_keys(err: &StorageDomainError) -> &'static [&'static str] {
    match err {
        StorageDomainError::InvalidGatewayUrl(_) => &GATEWAY_URL_KEYS,
        StorageDomainError::ZeroPort => &PORT_KEYS,
        _ => &ENDPOINT_KEYS,
    }
}
