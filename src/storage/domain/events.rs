//! Bus names and payloads published by a storage backend.
//!
//! The names are a wire contract other modules subscribe to.

use super::{BackendName, ConfigurationError};
use crate::health::StatusTransition;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Event that switches spawned-process log forwarding on.
pub const LOGS_STORAGE_ENABLE: &str = "logs:storage:enable";

/// Event that switches spawned-process log forwarding off.
pub const LOGS_STORAGE_DISABLE: &str = "logs:storage:disable";

/// Event exposing a backend client to an interactive console.
pub const RUNCODE_REGISTER: &str = "runcode:register";

/// Names of every bus surface one backend owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEvents {
    backend: BackendName,
}

impl BackendEvents {
    /// Creates the name set for `backend`.
    #[must_use]
    pub const fn new(backend: BackendName) -> Self {
        Self { backend }
    }

    /// Returns the backend these names belong to.
    #[must_use]
    pub const fn backend(&self) -> &BackendName {
        &self.backend
    }

    /// Name used for health registration and `check:*` events, e.g. `Swarm`.
    #[must_use]
    pub fn service_name(&self) -> String {
        self.backend.display_name()
    }

    /// `<backend>:process:started`.
    #[must_use]
    pub fn process_started(&self) -> String {
        format!("{}:process:started", self.backend)
    }

    /// `<backend>:config:warning`.
    #[must_use]
    pub fn config_warning(&self) -> String {
        format!("{}:config:warning", self.backend)
    }

    /// `check:backOnline:<Name>`.
    #[must_use]
    pub fn back_online(&self) -> String {
        StatusTransition::BackOnline.event_name(&self.service_name())
    }

    /// `check:wentOffline:<Name>`.
    #[must_use]
    pub fn went_offline(&self) -> String {
        StatusTransition::WentOffline.event_name(&self.service_name())
    }

    /// `logs:<backend>:enable`.
    #[must_use]
    pub fn logs_enable_command(&self) -> String {
        format!("logs:{}:enable", self.backend)
    }

    /// `logs:<backend>:disable`.
    #[must_use]
    pub fn logs_disable_command(&self) -> String {
        format!("logs:{}:disable", self.backend)
    }

    /// `log <backend> on`.
    #[must_use]
    pub fn console_log_on(&self) -> String {
        format!("log {} on", self.backend)
    }

    /// `log <backend> off`.
    #[must_use]
    pub fn console_log_off(&self) -> String {
        format!("log {} off", self.backend)
    }
}

/// Payload of `<backend>:process:started`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStarted {
    /// Startup error message, if startup failed.
    pub error: Option<String>,
    /// Whether this session launched a new process.
    pub started: bool,
}

impl ProcessStarted {
    /// Successful startup.
    #[must_use]
    pub const fn ok(started: bool) -> Self {
        Self {
            error: None,
            started,
        }
    }

    /// Failed startup; never reports a started process.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            started: false,
        }
    }

    /// Encodes the payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.error, "started": self.started })
    }

    /// Decodes a payload produced by [`ProcessStarted::to_payload`].
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}

/// Payload of `<backend>:config:warning`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWarning {
    /// Human-readable explanation.
    pub message: String,
    /// Configuration keys to fix.
    pub keys: Vec<String>,
}

impl ConfigWarning {
    /// Encodes the payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({ "message": self.message, "keys": self.keys })
    }

    /// Decodes a payload produced by [`ConfigWarning::to_payload`].
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}

impl From<&ConfigurationError> for ConfigWarning {
    fn from(error: &ConfigurationError) -> Self {
        Self {
            message: error.to_string(),
            keys: error.keys().to_vec(),
        }
    }
}
