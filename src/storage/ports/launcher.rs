//! Process launcher port.

use crate::storage::domain::{
    BackendConfig, BackendName, GatewayUrl, LaunchSettings, ProcessHandleId,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for launcher operations.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Everything needed to start one backend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Backend kind, e.g. `swarm`.
    pub kind: BackendName,
    /// Gateway the process must answer on.
    pub gateway: GatewayUrl,
    /// Validated storage configuration.
    pub config: BackendConfig,
    /// Web server, blockchain and CORS settings.
    pub settings: LaunchSettings,
}

impl LaunchRequest {
    /// Creates a launch request.
    #[must_use]
    pub const fn new(
        kind: BackendName,
        gateway: GatewayUrl,
        config: BackendConfig,
        settings: LaunchSettings,
    ) -> Self {
        Self {
            kind,
            gateway,
            config,
            settings,
        }
    }
}

/// A process the launcher started and reported ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchedProcess {
    /// Identifier used for termination.
    pub id: ProcessHandleId,
    /// OS process id, when the launcher knows it.
    pub pid: Option<u32>,
}

/// Starts and stops storage backend processes.
///
/// Retry or backoff policy, if any, lives in the implementation.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Starts the backend and waits until it is ready.
    async fn launch(&self, request: &LaunchRequest) -> LaunchResult<LaunchedProcess>;

    /// Stops a process previously returned by [`ProcessLauncher::launch`].
    ///
    /// Unknown identifiers are ignored.
    async fn terminate(&self, id: ProcessHandleId) -> LaunchResult<()>;
}

/// Errors returned by process launchers.
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    /// The launcher cannot run this backend kind.
    #[error("unsupported backend kind: {0}")]
    UnsupportedKind(BackendName),

    /// The process could not be spawned.
    #[error("failed to spawn {kind} process: {reason}")]
    Spawn {
        /// Backend kind.
        kind: BackendName,
        /// Spawn failure description.
        reason: String,
    },

    /// The process exited before becoming ready.
    #[error("{kind} process exited before it became ready (status: {status})")]
    ExitedEarly {
        /// Backend kind.
        kind: BackendName,
        /// Exit status description.
        status: String,
    },

    /// The process never became reachable.
    #[error("{kind} process was not reachable within {timeout:?}")]
    ReadinessTimeout {
        /// Backend kind.
        kind: BackendName,
        /// Elapsed bound.
        timeout: Duration,
    },

    /// Generic runtime failure.
    #[error("launcher runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl LaunchError {
    /// Wraps a runtime error from the launcher adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
