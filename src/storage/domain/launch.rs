//! Host settings handed to the process launcher.

use serde::{Deserialize, Serialize};

/// Web server the dapp is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServerConfig {
    /// Whether the web server runs.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Listening host.
    #[serde(default = "localhost")]
    pub host: String,
    /// Listening port.
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl WebServerConfig {
    /// Returns the public origin, e.g. `http://localhost:8000`.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: localhost(),
            port: default_web_port(),
        }
    }
}

/// Blockchain node the storage backend talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainConfig {
    /// RPC host.
    #[serde(default = "localhost")]
    pub rpc_host: String,
    /// RPC port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    /// Account the backend signs with, if any.
    #[serde(default)]
    pub account: Option<String>,
}

impl BlockchainConfig {
    /// Returns the RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.rpc_host, self.rpc_port)
    }
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_host: localhost(),
            rpc_port: default_rpc_port(),
            account: None,
        }
    }
}

/// Everything a launcher needs besides the backend's own configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Web server settings.
    #[serde(default)]
    pub web_server: WebServerConfig,
    /// Blockchain settings.
    #[serde(default)]
    pub blockchain: BlockchainConfig,
    /// Extra CORS origins.
    #[serde(default)]
    pub cors_parts: Vec<String>,
}

impl LaunchSettings {
    /// Returns the CORS allow-list: the web server origin, when enabled,
    /// followed by the configured extra origins, without duplicates.
    #[must_use]
    pub fn cors_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::with_capacity(self.cors_parts.len() + 1);
        if self.web_server.enabled {
            domains.push(self.web_server.origin());
        }
        for part in &self.cors_parts {
            let trimmed = part.trim();
            if !trimmed.is_empty() && !domains.iter().any(|domain| domain == trimmed) {
                domains.push(trimmed.to_owned());
            }
        }
        domains
    }
}

const fn enabled_by_default() -> bool {
    true
}

fn localhost() -> String {
    "localhost".to_owned()
}

const fn default_web_port() -> u16 {
    8000
}

const fn default_rpc_port() -> u16 {
    8545
}
