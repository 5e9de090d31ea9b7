//! Service status values and the de-bounce state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Availability status of a monitored service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// No check has completed yet.
    Unknown,
    /// A check is in flight.
    Checking,
    /// The last check reached the service.
    Available,
    /// The last check failed, timed out, or was abandoned.
    Unavailable,
    /// The service is switched off by configuration. Terminal.
    Disabled,
}

impl ServiceStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Disabled => "disabled",
        }
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unknown, Self::Disabled)
                | (
                    Self::Unknown | Self::Available | Self::Unavailable,
                    Self::Checking
                )
                | (
                    Self::Unknown | Self::Checking,
                    Self::Available | Self::Unavailable
                )
                | (Self::Available, Self::Unavailable)
                | (Self::Unavailable, Self::Available)
        )
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned while parsing a service status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown service status: {0}")]
pub struct ParseServiceStatusError(pub String);

impl TryFrom<&str> for ServiceStatus {
    type Error = ParseServiceStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "checking" => Ok(Self::Checking),
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseServiceStatusError(value.to_owned())),
        }
    }
}

/// Status change worth announcing on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTransition {
    /// The service became reachable.
    BackOnline,
    /// The service stopped being reachable.
    WentOffline,
}

impl StatusTransition {
    /// Returns the bus event name for `service`, e.g.
    /// `check:backOnline:Swarm`.
    #[must_use]
    pub fn event_name(self, service: &str) -> String {
        match self {
            Self::BackOnline => format!("check:backOnline:{service}"),
            Self::WentOffline => format!("check:wentOffline:{service}"),
        }
    }
}

/// De-bounce state machine driven by one poll loop.
///
/// `record` yields a [`StatusTransition`] only when the settled result
/// differs from the previous settled result. The first settled result counts
/// as a change only when the service is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTracker {
    current: ServiceStatus,
    last_settled: Option<ServiceStatus>,
}

impl StatusTracker {
    /// Creates a tracker in [`ServiceStatus::Unknown`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: ServiceStatus::Unknown,
            last_settled: None,
        }
    }

    /// Creates a tracker pinned to [`ServiceStatus::Disabled`].
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            current: ServiceStatus::Disabled,
            last_settled: None,
        }
    }

    /// Returns the current status.
    #[must_use]
    pub const fn current(&self) -> ServiceStatus {
        self.current
    }

    /// Marks a probe as in flight. Returns `false` when disabled.
    pub fn begin_check(&mut self) -> bool {
        if !self.current.can_transition_to(ServiceStatus::Checking) {
            return self.current == ServiceStatus::Checking;
        }
        self.current = ServiceStatus::Checking;
        true
    }

    /// Records a probe result and returns the transition it caused, if any.
    pub fn record(&mut self, available: bool) -> Option<StatusTransition> {
        if self.current == ServiceStatus::Disabled {
            return None;
        }
        let next = if available {
            ServiceStatus::Available
        } else {
            ServiceStatus::Unavailable
        };
        let transition = match (self.last_settled, next) {
            (None | Some(ServiceStatus::Unavailable), ServiceStatus::Available) => {
                Some(StatusTransition::BackOnline)
            }
            (Some(ServiceStatus::Available), ServiceStatus::Unavailable) => {
                Some(StatusTransition::WentOffline)
            }
            _ => None,
        };
        self.current = next;
        self.last_settled = Some(next);
        transition
    }

    /// Drops an in-flight probe without announcing anything.
    ///
    /// The status becomes [`ServiceStatus::Unavailable`]; the settled history
    /// used for de-bouncing is left untouched.
    pub fn abandon_check(&mut self) {
        if self.current == ServiceStatus::Checking {
            self.current = ServiceStatus::Unavailable;
        }
    }

    /// Pins the tracker to [`ServiceStatus::Disabled`].
    pub fn disable(&mut self) {
        self.current = ServiceStatus::Disabled;
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
