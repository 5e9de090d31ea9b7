//! Health check and registrar contracts.

use super::MonitorSubscription;
use crate::bus::BusResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Binary on/off result of one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// The service answered.
    On,
    /// The service did not answer or the check failed.
    Off,
}

impl ServiceState {
    /// Maps an availability flag to a state.
    #[must_use]
    pub const fn from_available(available: bool) -> Self {
        if available { Self::On } else { Self::Off }
    }

    /// Returns whether the service is on.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// `{name, status}` answer returned by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheckReport {
    name: String,
    status: ServiceState,
}

impl ServiceCheckReport {
    /// Creates a report.
    #[must_use]
    pub fn new(name: impl Into<String>, status: ServiceState) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }

    /// Returns the reported service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the reported state.
    #[must_use]
    pub const fn status(&self) -> ServiceState {
        self.status
    }
}

/// A side-effect-free check invoked by the health aggregator.
#[async_trait]
pub trait ServiceCheck: Send + Sync {
    /// Runs the check once.
    ///
    /// Failures are reported as [`ServiceState::Off`]; the check never
    /// errors.
    async fn check(&self) -> ServiceCheckReport;
}

/// Aggregator accepting `services:register` requests.
pub trait ServiceRegistrar: Send + Sync {
    /// Starts polling `check` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::bus::BusError::DuplicateService`] when `name` is
    /// already polled.
    fn register_service(
        &self,
        name: &str,
        check: Arc<dyn ServiceCheck>,
    ) -> BusResult<MonitorSubscription>;
}
