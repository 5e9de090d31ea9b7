//! Validated storage backend configuration.
//!
//! The raw storage section is deserialised once into [`RawStorageConfig`] and
//! converted through `TryFrom` into the immutable [`BackendConfig`] that every
//! component reads.

use super::StorageDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8500;

/// Gateway transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// Returns the URL scheme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Protocol {
    type Error = StorageDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(StorageDomainError::UnsupportedProtocol(value.to_owned())),
        }
    }
}

/// Context the host application is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunContext {
    /// Long-running development session.
    Run,
    /// One-shot build.
    Build,
    /// Upload of build output to storage; forces gate evaluation.
    Upload,
    /// Interactive console.
    Console,
    /// Test run.
    Test,
    /// Any other context.
    #[serde(other)]
    Other,
}

/// One entry of the ordered dapp-connection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DappConnection {
    provider: String,
    protocol: Option<Protocol>,
    host: Option<String>,
    port: Option<u16>,
}

impl DappConnection {
    /// Creates a connection entry naming `provider`.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            protocol: None,
            host: None,
            port: None,
        }
    }

    /// Sets the connection endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        self.protocol = Some(protocol);
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the endpoint protocol, if configured.
    #[must_use]
    pub const fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Returns the endpoint host, if configured.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the endpoint port, if configured.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Immutable storage configuration read by the gate and the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    enabled: bool,
    available_providers: BTreeSet<String>,
    upload_provider: String,
    dapp_connections: Vec<DappConnection>,
    host: String,
    port: u16,
    protocol: Protocol,
    explicit_gateway_url: Option<String>,
    get_url: Option<String>,
}

impl BackendConfig {
    /// Creates a disabled configuration uploading through `upload_provider`
    /// at `http://localhost:8500`.
    #[must_use]
    pub fn new(upload_provider: impl Into<String>) -> Self {
        Self {
            enabled: false,
            available_providers: BTreeSet::new(),
            upload_provider: upload_provider.into(),
            dapp_connections: Vec::new(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            protocol: Protocol::Http,
            explicit_gateway_url: None,
            get_url: None,
        }
    }

    /// Sets the `enabled` flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the providers the host knows how to run.
    #[must_use]
    pub fn with_available_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a dapp-connection entry.
    #[must_use]
    pub fn with_dapp_connection(mut self, connection: DappConnection) -> Self {
        self.dapp_connections.push(connection);
        self
    }

    /// Sets the gateway endpoint used for URL derivation.
    #[must_use]
    pub fn with_endpoint(mut self, protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        self.protocol = protocol;
        self.host = host.into();
        self.port = port;
        self
    }

    /// Sets an explicit gateway URL, bypassing derivation.
    #[must_use]
    pub fn with_explicit_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.explicit_gateway_url = Some(url.into());
        self
    }

    /// Sets the public retrieval URL prefix for uploaded content.
    #[must_use]
    pub fn with_get_url(mut self, url: impl Into<String>) -> Self {
        self.get_url = Some(url.into());
        self
    }

    /// Returns whether storage is enabled by configuration.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the providers the host can run.
    #[must_use]
    pub const fn available_providers(&self) -> &BTreeSet<String> {
        &self.available_providers
    }

    /// Returns the configured upload provider name.
    #[must_use]
    pub fn upload_provider(&self) -> &str {
        &self.upload_provider
    }

    /// Returns the ordered dapp-connection entries.
    #[must_use]
    pub fn dapp_connections(&self) -> &[DappConnection] {
        &self.dapp_connections
    }

    /// Returns the gateway host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the gateway port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the gateway protocol.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the explicit gateway URL, if configured.
    #[must_use]
    pub fn explicit_gateway_url(&self) -> Option<&str> {
        self.explicit_gateway_url.as_deref()
    }

    /// Returns the retrieval URL prefix, if configured.
    #[must_use]
    pub fn get_url(&self) -> Option<&str> {
        self.get_url.as_deref()
    }

    /// Returns whether `provider` is listed as available.
    #[must_use]
    pub fn is_available_provider(&self, provider: &str) -> bool {
        self.available_providers.contains(provider)
    }

    /// Returns whether the upload section or any dapp connection names
    /// `provider`.
    #[must_use]
    pub fn designates(&self, provider: &str) -> bool {
        self.upload_provider == provider
            || self
                .dapp_connections
                .iter()
                .any(|connection| connection.provider == provider)
    }
}

/// Storage section as written in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawStorageConfig {
    /// Whether storage is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Providers the host can run.
    #[serde(default)]
    pub available_providers: Vec<String>,
    /// Upload target.
    #[serde(default)]
    pub upload: RawUploadSection,
    /// Ordered connection list offered to dapps.
    #[serde(default, rename = "dappConnection")]
    pub dapp_connection: Vec<RawDappConnection>,
    /// Explicit gateway URL overriding derivation.
    #[serde(default, rename = "gatewayUrl")]
    pub gateway_url: Option<String>,
}

/// Upload section as written in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawUploadSection {
    /// Upload provider name.
    #[serde(default)]
    pub provider: String,
    /// Gateway protocol.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Gateway host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Gateway port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public retrieval URL prefix.
    #[serde(default, rename = "getUrl")]
    pub get_url: Option<String>,
}

impl Default for RawUploadSection {
    fn default() -> Self {
        Self {
            provider: String::new(),
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
            get_url: None,
        }
    }
}

fn default_protocol() -> String {
    Protocol::Http.as_str().to_owned()
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Dapp-connection entry as written in the settings file.
///
/// Keyword entries such as `"$WEB3"` name no provider and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawDappConnection {
    /// Symbolic connection keyword.
    Keyword(String),
    /// Provider endpoint entry.
    Entry {
        /// Provider name.
        provider: String,
        /// Endpoint protocol.
        #[serde(default)]
        protocol: Option<String>,
        /// Endpoint host.
        #[serde(default)]
        host: Option<String>,
        /// Endpoint port.
        #[serde(default)]
        port: Option<u16>,
    },
}

impl RawDappConnection {
    /// Validates the entry, yielding `None` for keywords.
    ///
    /// # Errors
    ///
    /// Returns [`StorageDomainError::UnsupportedProtocol`] for an unknown
    /// endpoint protocol.
    pub fn into_connection(self) -> Result<Option<DappConnection>, StorageDomainError> {
        match self {
            Self::Keyword(_) => Ok(None),
            Self::Entry {
                provider,
                protocol,
                host,
                port,
            } => Ok(Some(DappConnection {
                provider: provider.trim().to_ascii_lowercase(),
                protocol: protocol.as_deref().map(Protocol::try_from).transpose()?,
                host,
                port,
            })),
        }
    }
}

/// Gateway URL and port are kept as written; [`super::ConfigGate`] rejects
/// unusable endpoints for this backend only.
impl TryFrom<RawStorageConfig> for BackendConfig {
    type Error = StorageDomainError;

    fn try_from(raw: RawStorageConfig) -> Result<Self, Self::Error> {
        let RawStorageConfig {
            enabled,
            available_providers,
            upload,
            dapp_connection,
            gateway_url,
        } = raw;

        let protocol = Protocol::try_from(upload.protocol.as_str())?;

        let mut dapp_connections = Vec::with_capacity(dapp_connection.len());
        for entry in dapp_connection {
            if let Some(connection) = entry.into_connection()? {
                dapp_connections.push(connection);
            }
        }

        let explicit_gateway_url = gateway_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());

        Ok(Self {
            enabled,
            available_providers: available_providers
                .into_iter()
                .map(|provider| provider.trim().to_ascii_lowercase())
                .collect(),
            upload_provider: upload.provider.trim().to_ascii_lowercase(),
            dapp_connections,
            host: upload.host.trim().to_owned(),
            port: upload.port,
            protocol,
            explicit_gateway_url,
            get_url: upload.get_url.filter(|url| !url.trim().is_empty()),
        })
    }
}
