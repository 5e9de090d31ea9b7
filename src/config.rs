//! Settings file loading.
//!
//! The settings file is JSON. Only the `storage` section is required:
//!
//! ```json
//! {
//!   "backend": "swarm",
//!   "storage": {
//!     "enabled": true,
//!     "available_providers": ["ipfs", "swarm"],
//!     "upload": {"provider": "swarm", "host": "localhost", "port": 8500},
//!     "dappConnection": ["$WEB3", {"provider": "swarm"}]
//!   },
//!   "host": {"build_dir": "dist/", "contexts": ["run"]},
//!   "monitor": {"interval_ms": 5000, "probe_timeout_ms": 3000},
//!   "launcher": {"program": "swarm", "ready_timeout_ms": 30000, "ready_poll_ms": 500}
//! }
//! ```

use crate::health::PollPolicy;
use crate::storage::adapters::ReadinessPolicy;
use crate::storage::domain::{
    BackendConfig, BackendName, LaunchSettings, RawStorageConfig, RunContext, StorageDomainError,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BACKEND: &str = "swarm";
const DEFAULT_BUILD_DIR: &str = "dist/";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// Settings file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for the expected shape.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value failed domain validation.
    #[error("invalid settings: {0}")]
    Invalid(#[from] StorageDomainError),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Host section: build output, run contexts and launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostSettings {
    /// Directory uploaded by the upload command.
    #[serde(default = "default_build_dir")]
    pub build_dir: Utf8PathBuf,
    /// Contexts the host runs in.
    #[serde(default = "default_contexts")]
    pub contexts: Vec<RunContext>,
    /// Web server, blockchain and CORS settings.
    #[serde(flatten)]
    pub launch: LaunchSettings,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            contexts: default_contexts(),
            launch: LaunchSettings::default(),
        }
    }
}

/// Monitor section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MonitorSettings {
    /// Milliseconds between probe cycles.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Milliseconds after which a probe counts as failed.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Launcher section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LauncherSettings {
    /// Executable to run; defaults to the backend name.
    #[serde(default)]
    pub program: Option<String>,
    /// Milliseconds to wait for a launched node to answer.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    /// Milliseconds between readiness probes.
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            program: None,
            ready_timeout_ms: default_ready_timeout_ms(),
            ready_poll_ms: default_ready_poll_ms(),
        }
    }
}

/// Complete settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupervisorSettings {
    /// Backend this host supervises.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Raw storage section.
    pub storage: RawStorageConfig,
    /// Host section.
    #[serde(default)]
    pub host: HostSettings,
    /// Monitor section.
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Launcher section.
    #[serde(default)]
    pub launcher: LauncherSettings,
}

impl SupervisorSettings {
    /// Reads and parses the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] or [`SettingsError::Parse`].
    pub fn load(path: &Utf8Path) -> SettingsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed input.
    pub fn from_json_str(contents: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Returns the validated backend name.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for malformed names.
    pub fn backend_name(&self) -> SettingsResult<BackendName> {
        Ok(BackendName::new(self.backend.as_str())?)
    }

    /// Converts the storage section into a validated [`BackendConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when validation fails.
    pub fn backend_config(&self) -> SettingsResult<BackendConfig> {
        Ok(BackendConfig::try_from(self.storage.clone())?)
    }

    /// Returns the health poll policy.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.monitor.interval_ms),
            Duration::from_millis(self.monitor.probe_timeout_ms),
        )
    }

    /// Returns the launcher readiness policy.
    #[must_use]
    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy::new(
            Duration::from_millis(self.launcher.ready_timeout_ms),
            Duration::from_millis(self.launcher.ready_poll_ms),
        )
    }

    /// Returns the executable the launcher runs.
    #[must_use]
    pub fn program(&self) -> &str {
        self.launcher.program.as_deref().unwrap_or(&self.backend)
    }

    /// Returns the web server, blockchain and CORS settings.
    #[must_use]
    pub fn launch_settings(&self) -> LaunchSettings {
        self.host.launch.clone()
    }
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_owned()
}

fn default_build_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_BUILD_DIR)
}

fn default_contexts() -> Vec<RunContext> {
    vec![RunContext::Run]
}

const fn default_interval_ms() -> u64 {
    5_000
}

const fn default_probe_timeout_ms() -> u64 {
    3_000
}

const fn default_ready_timeout_ms() -> u64 {
    30_000
}

const fn default_ready_poll_ms() -> u64 {
    500
}
