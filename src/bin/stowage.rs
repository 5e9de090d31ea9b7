//! Runs one storage backend supervisor until interrupted.
//!
//! Usage:
//!
//! ```text
//! stowage <settings-path>
//! ```
//!
//! The settings file is described in [`stowage::config`]. Lines typed on
//! standard input are dispatched as console commands (`log swarm on`,
//! `upload`, ...); replies are written to the log. Ctrl-C tears the session
//! down and stops any node this process launched.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use mockable::DefaultClock;
use std::env;
use std::sync::Arc;
use stowage::bus::{
    BusError, CommandError, ConsoleCommand, ConsoleHandler, ConsoleMatcher, EventBus,
};
use stowage::config::{SettingsError, SupervisorSettings};
use stowage::health::ServiceHealthMonitor;
use stowage::storage::{
    adapters::{CommandProcessLauncher, HttpGatewayProbe},
    domain::{BackendConfig, GatewayUrl},
    ports::{ProbeError, StorageClient, UploadError, UploadResult},
    services::{StorageModule, StorageModuleDeps, UploadProviderRegistry},
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can stop the host.
#[derive(Debug, Error)]
enum HostError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings_path = parse_args(env::args_os().map(|arg| arg.into_string()))?;
    run(&settings_path).await.map_err(Into::into)
}

fn parse_args(
    mut args: impl Iterator<Item = Result<String, std::ffi::OsString>>,
) -> Result<Utf8PathBuf, HostError> {
    let _program = args.next();
    let path = args
        .next()
        .ok_or_else(|| HostError::InvalidArgs("missing settings path argument".into()))?
        .map_err(|_| HostError::InvalidArgs("argument is not valid UTF-8".into()))?;
    if let Some(extra) = args.next() {
        let extra_arg = extra.unwrap_or_default();
        return Err(HostError::InvalidArgs(format!(
            "unexpected extra argument: {extra_arg}"
        )));
    }
    Ok(Utf8PathBuf::from(path))
}

async fn run(settings_path: &Utf8Path) -> Result<(), HostError> {
    let settings = SupervisorSettings::load(settings_path)?;
    let backend = settings.backend_name()?;
    let config = settings.backend_config()?;
    let policy = settings.poll_policy();

    let bus = Arc::new(EventBus::new());
    let monitor = ServiceHealthMonitor::new(&bus, policy);
    monitor.install()?;

    let probe = Arc::new(HttpGatewayProbe::new(policy.probe_timeout())?);
    let launcher = Arc::new(CommandProcessLauncher::new(
        settings.program(),
        Arc::clone(&probe),
        settings.readiness_policy(),
    ));
    launcher.attach_log_toggle(&bus)?;
    let uploads = Arc::new(UploadProviderRegistry::new());

    let module = StorageModule::new(
        backend,
        config.clone(),
        StorageModuleDeps {
            bus: Arc::clone(&bus),
            probe,
            launcher,
            clock: Arc::new(DefaultClock),
            client: Arc::new(UnsupportedTransfer),
            uploads: Arc::clone(&uploads),
        },
    )
    .with_contexts(settings.host.contexts.iter().copied())
    .with_launch_settings(settings.launch_settings());
    let handle = module.start().await;
    info!(outcome = ?handle.outcome(), status = %handle.status().current(), "storage module started");

    bus.register_console_command(ConsoleCommand::new(
        ConsoleMatcher::exact(["upload"]),
        Arc::new(UploadCommand {
            uploads,
            build_dir: settings.host.build_dir.clone(),
            config,
        }),
    ))?;

    console_loop(&bus).await;

    monitor.shutdown();
    if let Err(err) = handle.shutdown().await {
        warn!(error = %err, "failed to stop storage node");
    }
    bus.shutdown();
    Ok(())
}

async fn console_loop(bus: &EventBus) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(input)) => dispatch(bus, input.trim()).await,
                Ok(None) => {
                    debug!("console input closed; waiting for interrupt");
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        warn!(error = %err, "failed to listen for interrupt");
                    }
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "failed to read console input");
                    break;
                }
            },
        }
    }
}

async fn dispatch(bus: &EventBus, input: &str) {
    if input.is_empty() {
        return;
    }
    match bus.run_console_command(input).await {
        Ok(reply) => info!("{reply}"),
        Err(err) => warn!("{err}"),
    }
}

/// Console `upload` command running the configured upload provider.
struct UploadCommand {
    uploads: Arc<UploadProviderRegistry>,
    build_dir: Utf8PathBuf,
    config: BackendConfig,
}

#[async_trait]
impl ConsoleHandler for UploadCommand {
    async fn process(&self, _bus: &EventBus, _input: &str) -> Result<String, CommandError> {
        self.uploads
            .invoke_configured(&self.build_dir, &self.config)
            .await
            .map(|locator| format!("Dapp available at {}", locator.url()))
            .map_err(|err| CommandError::new(err.to_string()))
    }
}

/// Storage client for hosts without a bundled transfer implementation.
struct UnsupportedTransfer;

#[async_trait]
impl StorageClient for UnsupportedTransfer {
    async fn upload_directory(
        &self,
        gateway: &GatewayUrl,
        _directory: &Utf8Path,
    ) -> UploadResult<String> {
        Err(UploadError::Transfer(format!(
            "this host has no transfer client for {gateway}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(values: &[&str]) -> impl Iterator<Item = Result<String, std::ffi::OsString>> {
        values
            .iter()
            .map(|value| Ok((*value).to_owned()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[rstest]
    fn parse_args_accepts_settings_path() {
        let path = parse_args(args(&["stowage", "stowage.json"])).expect("args should parse");

        assert_eq!(path, Utf8PathBuf::from("stowage.json"));
    }

    #[rstest]
    #[case(&["stowage"])]
    #[case(&["stowage", "a.json", "b.json"])]
    fn parse_args_rejects_wrong_arity(#[case] values: &[&str]) {
        assert!(matches!(
            parse_args(args(values)),
            Err(HostError::InvalidArgs(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn dispatch_ignores_blank_lines() {
        let bus = EventBus::new();

        dispatch(&bus, "").await;

        assert!(!bus.is_shut_down());
    }

    #[rstest]
    #[tokio::test]
    async fn unsupported_transfer_reports_error() {
        let gateway = GatewayUrl::explicit("http://localhost:8500").expect("valid url");

        let result = UnsupportedTransfer
            .upload_directory(&gateway, Utf8Path::new("dist"))
            .await;

        assert!(matches!(result, Err(UploadError::Transfer(_))));
    }
}
