//! In-memory process launcher.

use super::ScriptedProbe;
use crate::storage::{
    domain::ProcessHandleId,
    ports::{LaunchError, LaunchRequest, LaunchResult, LaunchedProcess, ProcessLauncher},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Launcher that records requests instead of spawning processes.
///
/// When linked to a [`ScriptedProbe`], a launch brings the gateway online
/// and terminating the last process takes it offline again.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessLauncher {
    state: Arc<RwLock<InMemoryLauncherState>>,
    gateway: Option<ScriptedProbe>,
}

#[derive(Debug, Default)]
struct InMemoryLauncherState {
    launches: Vec<LaunchRequest>,
    running: HashSet<ProcessHandleId>,
    terminated: Vec<ProcessHandleId>,
    failure: Option<LaunchError>,
}

impl InMemoryProcessLauncher {
    /// Creates a launcher with no linked gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links the launcher to the probe standing in for the gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: ScriptedProbe) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Makes every later launch fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns launcher runtime errors when lock acquisition fails.
    pub fn fail_with(&self, error: LaunchError) -> LaunchResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LaunchError::runtime(std::io::Error::other(err.to_string())))?;
        state.failure = Some(error);
        Ok(())
    }

    /// Returns every launch request received, in order.
    #[must_use]
    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.state
            .read()
            .map(|state| state.launches.clone())
            .unwrap_or_default()
    }

    /// Returns identifiers passed to [`ProcessLauncher::terminate`].
    #[must_use]
    pub fn terminated(&self) -> Vec<ProcessHandleId> {
        self.state
            .read()
            .map(|state| state.terminated.clone())
            .unwrap_or_default()
    }

    /// Returns whether `id` is still running.
    #[must_use]
    pub fn is_running(&self, id: ProcessHandleId) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.running.contains(&id))
    }
}

#[async_trait]
impl ProcessLauncher for InMemoryProcessLauncher {
    async fn launch(&self, request: &LaunchRequest) -> LaunchResult<LaunchedProcess> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LaunchError::runtime(std::io::Error::other(err.to_string())))?;
        state.launches.push(request.clone());
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }

        let id = ProcessHandleId::new();
        state.running.insert(id);
        if let Some(gateway) = &self.gateway {
            gateway.set_available(true);
        }
        Ok(LaunchedProcess { id, pid: None })
    }

    async fn terminate(&self, id: ProcessHandleId) -> LaunchResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LaunchError::runtime(std::io::Error::other(err.to_string())))?;
        if state.running.remove(&id) {
            state.terminated.push(id);
        }
        if state.running.is_empty() {
            if let Some(gateway) = &self.gateway {
                gateway.set_available(false);
            }
        }
        Ok(())
    }
}
