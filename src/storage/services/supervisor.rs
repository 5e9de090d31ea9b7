//! Reuse-or-launch supervision of one storage backend.

use crate::storage::{
    domain::{
        BackendConfig, BackendName, GatewayUrl, LaunchSettings, ProcessHandle, StartupPhase,
        StorageDomainError,
    },
    ports::{AvailabilityProbe, LaunchError, LaunchRequest, ProcessLauncher},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, trace};

/// Service-level errors for backend supervision.
#[derive(Debug, Clone, Error)]
pub enum SupervisorError {
    /// The launcher could not start the backend.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// A startup phase transition was rejected.
    #[error(transparent)]
    Domain(#[from] StorageDomainError),
}

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// The backend the supervisor resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisedBackend {
    /// Handle to the running backend.
    pub handle: ProcessHandle,
    /// Whether this call launched a new process.
    pub started: bool,
}

#[derive(Debug)]
struct SupervisorState {
    phase: StartupPhase,
    handle: Option<ProcessHandle>,
}

impl SupervisorState {
    fn advance(&mut self, target: StartupPhase) -> SupervisorResult<()> {
        if !self.phase.can_transition_to(target) {
            return Err(StorageDomainError::InvalidStartupTransition {
                from: self.phase,
                to: target,
            }
            .into());
        }
        self.phase = target;
        Ok(())
    }
}

/// Owns the decision to reuse a reachable backend or launch one.
///
/// The probe-then-launch sequence is not atomic: a backend started by
/// someone else between the two steps leads to two running backends, and
/// the supervisor keeps using the one it launched.
pub struct ProcessSupervisor<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    backend: BackendName,
    config: BackendConfig,
    probe: Arc<P>,
    launcher: Arc<L>,
    clock: Arc<C>,
    state: Mutex<SupervisorState>,
}

impl<P, L, C> ProcessSupervisor<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    /// Creates a supervisor for `backend`.
    #[must_use]
    pub fn new(
        backend: BackendName,
        config: BackendConfig,
        probe: Arc<P>,
        launcher: Arc<L>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            backend,
            config,
            probe,
            launcher,
            clock,
            state: Mutex::new(SupervisorState {
                phase: StartupPhase::Init,
                handle: None,
            }),
        }
    }

    /// Makes sure a backend answers on `gateway`.
    ///
    /// Probes once; a reachable gateway is adopted as an external backend,
    /// otherwise exactly one launch is attempted. A probe error counts as
    /// unreachable. Once a handle exists, later calls return it with
    /// `started = false` and neither probe nor launch.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Launch`] unchanged when the launcher fails;
    /// no retry happens here.
    pub async fn ensure_running(
        &self,
        gateway: &GatewayUrl,
        settings: &LaunchSettings,
    ) -> SupervisorResult<SupervisedBackend> {
        let mut state = self.state.lock().await;
        if let Some(handle) = &state.handle {
            return Ok(SupervisedBackend {
                handle: handle.clone(),
                started: false,
            });
        }

        state.advance(StartupPhase::Checked)?;
        let name = self.backend.display_name();
        let reachable = match self.probe.is_available(gateway).await {
            Ok(available) => available,
            Err(err) => {
                trace!(backend = %self.backend, error = %err, "availability probe failed");
                false
            }
        };

        if reachable {
            info!(backend = %self.backend, "{name} node found, using currently running node");
            state.advance(StartupPhase::Reusing)?;
            let handle = ProcessHandle::external(&*self.clock);
            state.advance(StartupPhase::Ready)?;
            state.handle = Some(handle.clone());
            return Ok(SupervisedBackend {
                handle,
                started: false,
            });
        }

        info!(backend = %self.backend, "{name} node not found, attempting to start own node");
        state.advance(StartupPhase::Launching)?;
        let request = LaunchRequest::new(
            self.backend.clone(),
            gateway.clone(),
            self.config.clone(),
            settings.clone(),
        );
        match self.launcher.launch(&request).await {
            Ok(launched) => {
                let handle = ProcessHandle::spawned(launched.id, launched.pid, &*self.clock);
                state.advance(StartupPhase::Ready)?;
                state.handle = Some(handle.clone());
                Ok(SupervisedBackend {
                    handle,
                    started: true,
                })
            }
            Err(err) => {
                error!(backend = %self.backend, error = %err, "failed to launch {name} node");
                state.advance(StartupPhase::Init)?;
                Err(err.into())
            }
        }
    }

    /// Records that `process:started` has been announced.
    ///
    /// Calling this again once started is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Domain`] unless the backend is ready.
    pub async fn mark_started(&self) -> SupervisorResult<()> {
        let mut state = self.state.lock().await;
        if state.phase == StartupPhase::Started {
            return Ok(());
        }
        state.advance(StartupPhase::Started)
    }

    /// Terminates the backend if this session spawned it.
    ///
    /// External backends are left untouched. Returns whether a process was
    /// terminated; later calls return `false`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Launch`] when termination fails.
    pub async fn release(&self) -> SupervisorResult<bool> {
        let mut state = self.state.lock().await;
        let Some(handle) = state.handle.take() else {
            return Ok(false);
        };
        state.phase = StartupPhase::Init;
        if !handle.is_spawned() {
            trace!(backend = %self.backend, "leaving external node running");
            return Ok(false);
        }
        self.launcher.terminate(handle.id()).await?;
        info!(backend = %self.backend, process = %handle.id(), "stopped own node");
        Ok(true)
    }

    /// Returns the current startup phase.
    pub async fn phase(&self) -> StartupPhase {
        self.state.lock().await.phase
    }

    /// Returns the resolved backend handle, if any.
    pub async fn handle(&self) -> Option<ProcessHandle> {
        self.state.lock().await.handle.clone()
    }

    /// Returns the supervised backend name.
    #[must_use]
    pub const fn backend(&self) -> &BackendName {
        &self.backend
    }
}
