//! Gateway URL resolution.

use super::{BackendConfig, Protocol, StorageDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path appended to the gateway when no retrieval URL is configured.
pub const DEFAULT_GET_PATH: &str = "bzz:/";

/// Resolved network address of a storage backend.
///
/// Always non-empty and prefixed with `http://` or `https://`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayUrl(String);

impl GatewayUrl {
    /// Accepts an explicitly configured URL verbatim after trimming.
    ///
    /// A single trailing slash is dropped so that joined paths stay clean.
    ///
    /// # Errors
    ///
    /// Returns [`StorageDomainError::InvalidGatewayUrl`] when the value lacks
    /// an `http://` or `https://` prefix.
    pub fn explicit(value: impl Into<String>) -> Result<Self, StorageDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let has_scheme = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_scheme {
            return Err(StorageDomainError::InvalidGatewayUrl(raw));
        }
        Ok(Self(trimmed.trim_end_matches('/').to_owned()))
    }

    /// Builds `"{protocol}://{host}:{port}"`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageDomainError::EmptyGatewayHost`] or
    /// [`StorageDomainError::ZeroPort`].
    pub fn from_parts(
        protocol: Protocol,
        host: &str,
        port: u16,
    ) -> Result<Self, StorageDomainError> {
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(StorageDomainError::EmptyGatewayHost);
        }
        if port == 0 {
            return Err(StorageDomainError::ZeroPort);
        }
        Ok(Self(format!("{protocol}://{trimmed}:{port}")))
    }

    /// Derives the gateway URL for `config`.
    ///
    /// The explicit URL wins; otherwise the URL is built from the upload
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageDomainError`] when neither source yields a URL.
    pub fn derive(config: &BackendConfig) -> Result<Self, StorageDomainError> {
        match config.explicit_gateway_url() {
            Some(url) => Self::explicit(url),
            None => Self::from_parts(config.protocol(), config.host(), config.port()),
        }
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends `path` with exactly one separating slash.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }

    /// Returns the public retrieval prefix for uploaded content.
    ///
    /// Uses the configured `getUrl` when present, else `{gateway}/bzz:/`.
    #[must_use]
    pub fn get_url(&self, config: &BackendConfig) -> String {
        config
            .get_url()
            .map_or_else(|| self.join(DEFAULT_GET_PATH), ToOwned::to_owned)
    }
}

impl AsRef<str> for GatewayUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for GatewayUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
