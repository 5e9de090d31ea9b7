//! Process launcher spawning real storage nodes.

use crate::bus::{BusResult, EventBus};
use crate::storage::{
    domain::{BackendName, LOGS_STORAGE_DISABLE, LOGS_STORAGE_ENABLE, ProcessHandleId},
    ports::{
        AvailabilityProbe, LaunchError, LaunchRequest, LaunchResult, LaunchedProcess,
        ProcessLauncher,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How long a terminated process gets to exit before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Timing settings for [`CommandProcessLauncher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    timeout: Duration,
    poll: Duration,
}

impl ReadinessPolicy {
    /// Creates a policy; zero durations are raised to one millisecond.
    #[must_use]
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        let floor = Duration::from_millis(1);
        Self {
            timeout: timeout.max(floor),
            poll: poll.max(floor),
        }
    }

    /// Returns the bound on waiting for readiness.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the pause between readiness probes.
    #[must_use]
    pub const fn poll(&self) -> Duration {
        self.poll
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_millis(500))
    }
}

/// Spawns the storage node executable and waits for its gateway.
///
/// Output lines of spawned nodes are forwarded to `tracing` only while log
/// forwarding is switched on; see
/// [`CommandProcessLauncher::attach_log_toggle`].
pub struct CommandProcessLauncher<P>
where
    P: AvailabilityProbe,
{
    program: String,
    probe: Arc<P>,
    readiness: ReadinessPolicy,
    logs_enabled: Arc<AtomicBool>,
    children: Mutex<HashMap<ProcessHandleId, Child>>,
}

impl<P> CommandProcessLauncher<P>
where
    P: AvailabilityProbe,
{
    /// Creates a launcher running `program`.
    #[must_use]
    pub fn new(program: impl Into<String>, probe: Arc<P>, readiness: ReadinessPolicy) -> Self {
        Self {
            program: program.into(),
            probe,
            readiness,
            logs_enabled: Arc::new(AtomicBool::new(false)),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether node output is currently forwarded.
    #[must_use]
    pub fn logs_enabled(&self) -> bool {
        self.logs_enabled.load(Ordering::Relaxed)
    }

    /// Switches output forwarding on or off.
    pub fn set_logs_enabled(&self, enabled: bool) {
        self.logs_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Subscribes the forwarding switch to `logs:storage:enable` and
    /// `logs:storage:disable`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::bus::BusError::ShutDown`] after bus teardown.
    pub fn attach_log_toggle(&self, bus: &EventBus) -> BusResult<()> {
        let on = Arc::clone(&self.logs_enabled);
        bus.on(LOGS_STORAGE_ENABLE, move |_| {
            on.store(true, Ordering::Relaxed);
            Ok(())
        })?;
        let off = Arc::clone(&self.logs_enabled);
        bus.on(LOGS_STORAGE_DISABLE, move |_| {
            off.store(false, Ordering::Relaxed);
            Ok(())
        })
    }

    /// Returns the command-line arguments for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::UnsupportedKind`] for unknown backend kinds.
    pub fn arguments(request: &LaunchRequest) -> LaunchResult<Vec<String>> {
        match request.kind.as_str() {
            "swarm" => {
                let mut args = vec![
                    "--bzzport".to_owned(),
                    request.config.port().to_string(),
                    "--bzzapi".to_owned(),
                    request.settings.blockchain.rpc_url(),
                ];
                let cors = request.settings.cors_domains();
                if !cors.is_empty() {
                    args.push("--corsdomain".to_owned());
                    args.push(cors.join(","));
                }
                if let Some(account) = &request.settings.blockchain.account {
                    args.push("--bzzaccount".to_owned());
                    args.push(account.clone());
                }
                Ok(args)
            }
            "ipfs" => Ok(vec!["daemon".to_owned()]),
            _ => Err(LaunchError::UnsupportedKind(request.kind.clone())),
        }
    }

    fn forward_output<R>(&self, kind: &BackendName, stream: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let enabled = Arc::clone(&self.logs_enabled);
        let backend = kind.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if enabled.load(Ordering::Relaxed) {
                    info!(target: "stowage::node", backend = %backend, "{line}");
                }
            }
        });
    }

    async fn await_ready(&self, child: &mut Child, request: &LaunchRequest) -> LaunchResult<()> {
        let mut ticker = time::interval(self.readiness.poll());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                exit = child.wait() => {
                    let status = exit.map_err(LaunchError::runtime)?;
                    return Err(LaunchError::ExitedEarly {
                        kind: request.kind.clone(),
                        status: status.to_string(),
                    });
                }
                _ = ticker.tick() => {
                    if matches!(self.probe.is_available(&request.gateway).await, Ok(true)) {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn stop_child(mut child: Child) -> LaunchResult<()> {
        if send_terminate(&child) && time::timeout(TERMINATE_GRACE, child.wait()).await.is_ok() {
            return Ok(());
        }
        match child.kill().await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(LaunchError::runtime(err)),
        }
    }
}

#[async_trait]
impl<P> ProcessLauncher for CommandProcessLauncher<P>
where
    P: AvailabilityProbe + 'static,
{
    async fn launch(&self, request: &LaunchRequest) -> LaunchResult<LaunchedProcess> {
        let args = Self::arguments(request)?;
        debug!(program = %self.program, ?args, "launching storage node");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| LaunchError::Spawn {
                kind: request.kind.clone(),
                reason: err.to_string(),
            })?;

        if let Some(stdout) = child.stdout.take() {
            self.forward_output(&request.kind, stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            self.forward_output(&request.kind, stderr);
        }

        let waited = time::timeout(self.readiness.timeout(), self.await_ready(&mut child, request))
            .await;
        match waited {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log_cleanup_failure(&request.kind, &Self::stop_child(child).await);
                return Err(err);
            }
            Err(_) => {
                log_cleanup_failure(&request.kind, &Self::stop_child(child).await);
                return Err(LaunchError::ReadinessTimeout {
                    kind: request.kind.clone(),
                    timeout: self.readiness.timeout(),
                });
            }
        }

        let id = ProcessHandleId::new();
        let pid = child.id();
        self.children.lock().await.insert(id, child);
        info!(backend = %request.kind, ?pid, "storage node ready");
        Ok(LaunchedProcess { id, pid })
    }

    async fn terminate(&self, id: ProcessHandleId) -> LaunchResult<()> {
        let Some(child) = self.children.lock().await.remove(&id) else {
            return Ok(());
        };
        debug!(process = %id, "terminating storage node");
        Self::stop_child(child).await
    }
}

/// Asks the process to exit. Returns `false` when no signal was sent.
#[cfg(unix)]
fn send_terminate(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    child
        .id()
        .and_then(|pid| i32::try_from(pid).ok())
        .is_some_and(|raw| kill(Pid::from_raw(raw), Signal::SIGTERM).is_ok())
}

#[cfg(not(unix))]
const fn send_terminate(_child: &Child) -> bool {
    false
}

fn log_cleanup_failure(kind: &BackendName, outcome: &LaunchResult<()>) {
    if let Err(err) = outcome {
        warn!(backend = %kind, error = %err, "failed to stop storage node after launch failure");
    }
}
