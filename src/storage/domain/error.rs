//! Error types for storage domain validation and configuration.

use super::{BackendName, StartupPhase};
use crate::bus::BusError;
use thiserror::Error;

/// Errors returned while constructing storage domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageDomainError {
    /// The backend name is empty after trimming.
    #[error("backend name must not be empty")]
    EmptyBackendName,

    /// The backend name contains characters outside `[a-z0-9_]`.
    #[error(
        "backend name '{0}' contains invalid characters (only lowercase alphanumeric and underscores allowed)"
    )]
    InvalidBackendName(String),

    /// The backend name exceeds the 100-character limit.
    #[error("backend name exceeds 100 character limit: {0}")]
    BackendNameTooLong(String),

    /// The protocol is neither `http` nor `https`.
    #[error("unsupported gateway protocol '{0}' (expected 'http' or 'https')")]
    UnsupportedProtocol(String),

    /// The gateway port is zero.
    #[error("gateway port must not be zero")]
    ZeroPort,

    /// No host is configured for gateway derivation.
    #[error("gateway host must not be empty")]
    EmptyGatewayHost,

    /// The explicit gateway URL lacks an `http://` or `https://` prefix.
    #[error("gateway URL '{0}' must start with 'http://' or 'https://'")]
    InvalidGatewayUrl(String),

    /// Transitioning between two startup phases is invalid.
    #[error("invalid startup transition: {from} -> {to}")]
    InvalidStartupTransition {
        /// Current phase.
        from: StartupPhase,
        /// Requested phase.
        to: StartupPhase,
    },
}

/// Misconfiguration that prevents one backend from starting.
///
/// Configuration errors are fatal to that backend's startup only; the host
/// keeps running.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The backend is enabled but no gateway URL can be derived.
    #[error(
        "{backend} is enabled in the config, however no URL can be determined for it; set one of: {}",
        .keys.join(", ")
    )]
    UnresolvableGateway {
        /// Backend being configured.
        backend: BackendName,
        /// Configuration keys that would make the URL derivable.
        keys: Vec<String>,
    },

    /// A command, console or service registration collided with an existing
    /// one.
    #[error("duplicate registration: {0}")]
    DuplicateRegistration(BusError),

    /// The bus refused a registration for a reason other than a collision.
    #[error("bus registration failed: {0}")]
    Registration(BusError),

    /// An upload provider with the same name is already registered.
    #[error("upload provider already registered: {0}")]
    DuplicateUploadProvider(String),

    /// The upload provider registry refused the provider.
    #[error("upload provider registration failed: {0}")]
    UploadRegistration(String),
}

impl From<BusError> for ConfigurationError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::DuplicateCommandHandler(_)
            | BusError::DuplicateService(_)
            | BusError::RegistrarAlreadyInstalled => Self::DuplicateRegistration(err),
            BusError::UnknownCommand(_)
            | BusError::NoMatchingConsoleCommand(_)
            | BusError::NoServiceRegistrar
            | BusError::ShutDown
            | BusError::Handler(_)
            | BusError::Runtime(_)
            | BusError::LockPoisoned(_) => Self::Registration(err),
        }
    }
}

impl ConfigurationError {
    /// Returns the configuration keys a user should fix, if known.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        match self {
            Self::UnresolvableGateway { keys, .. } => keys,
            Self::DuplicateRegistration(_)
            | Self::Registration(_)
            | Self::DuplicateUploadProvider(_)
            | Self::UploadRegistration(_) => &[],
        }
    }
}
