//! Supervised backend process handle and startup phases.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a supervised backend process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessHandleId(Uuid);

impl ProcessHandleId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ProcessHandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessHandleId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Who owns the running backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOwnership {
    /// Someone else started it; never terminated by us.
    External,
    /// We spawned it and terminate it on shutdown.
    Spawned,
}

impl ProcessOwnership {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Spawned => "spawned",
        }
    }
}

impl fmt::Display for ProcessOwnership {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Handle to the backend the supervisor resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    id: ProcessHandleId,
    pid: Option<u32>,
    ownership: ProcessOwnership,
    started_at: DateTime<Utc>,
}

impl ProcessHandle {
    /// Creates a handle for a backend someone else is running.
    #[must_use]
    pub fn external(clock: &impl Clock) -> Self {
        Self {
            id: ProcessHandleId::new(),
            pid: None,
            ownership: ProcessOwnership::External,
            started_at: clock.utc(),
        }
    }

    /// Creates a handle for a backend this session spawned.
    #[must_use]
    pub fn spawned(id: ProcessHandleId, pid: Option<u32>, clock: &impl Clock) -> Self {
        Self {
            id,
            pid,
            ownership: ProcessOwnership::Spawned,
            started_at: clock.utc(),
        }
    }

    /// Returns the handle identifier.
    #[must_use]
    pub const fn id(&self) -> ProcessHandleId {
        self.id
    }

    /// Returns the OS process id, when known.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Returns the ownership tag.
    #[must_use]
    pub const fn ownership(&self) -> ProcessOwnership {
        self.ownership
    }

    /// Returns when the backend was adopted or spawned.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns whether this session owns the process.
    #[must_use]
    pub const fn is_spawned(&self) -> bool {
        matches!(self.ownership, ProcessOwnership::Spawned)
    }
}

/// Step of the probe-then-maybe-launch startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPhase {
    /// Nothing has happened yet.
    Init,
    /// The gateway has been probed once.
    Checked,
    /// A reachable backend is being adopted.
    Reusing,
    /// A local backend is being launched.
    Launching,
    /// A backend is reachable and a handle exists.
    Ready,
    /// `process:started` has been announced.
    Started,
}

impl StartupPhase {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Checked => "checked",
            Self::Reusing => "reusing",
            Self::Launching => "launching",
            Self::Ready => "ready",
            Self::Started => "started",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// A failed launch returns to [`StartupPhase::Init`].
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Init, Self::Checked)
                | (Self::Checked, Self::Reusing | Self::Launching)
                | (Self::Reusing | Self::Launching, Self::Ready)
                | (Self::Launching, Self::Init)
                | (Self::Ready, Self::Started)
        )
    }
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
