//! Unit tests for the command process launcher.

use crate::bus::EventBus;
use crate::storage::{
    adapters::{CommandProcessLauncher, ReadinessPolicy, memory::ScriptedProbe},
    domain::{
        BackendConfig, BackendName, BlockchainConfig, GatewayUrl, LOGS_STORAGE_DISABLE,
        LOGS_STORAGE_ENABLE, LaunchSettings, Protocol, WebServerConfig,
    },
    ports::{LaunchError, LaunchRequest, ProcessLauncher},
};
use rstest::rstest;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

type TestLauncher = CommandProcessLauncher<ScriptedProbe>;

fn request(kind: &str, settings: LaunchSettings) -> LaunchRequest {
    let config = BackendConfig::new(kind).with_endpoint(Protocol::Http, "localhost", 8600);
    LaunchRequest::new(
        BackendName::new(kind).expect("valid backend name"),
        GatewayUrl::derive(&config).expect("gateway should derive"),
        config,
        settings,
    )
}

fn launcher(program: &str, probe: ScriptedProbe) -> TestLauncher {
    CommandProcessLauncher::new(
        program,
        Arc::new(probe),
        ReadinessPolicy::new(Duration::from_millis(200), Duration::from_millis(10)),
    )
}

#[rstest]
fn swarm_arguments_carry_port_rpc_cors_and_account() {
    let settings = LaunchSettings {
        web_server: WebServerConfig::default(),
        blockchain: BlockchainConfig {
            account: Some("0xabc".to_owned()),
            ..BlockchainConfig::default()
        },
        cors_parts: vec!["http://example.test".to_owned()],
    };

    let args = TestLauncher::arguments(&request("swarm", settings)).expect("swarm is supported");

    assert_eq!(
        args,
        vec![
            "--bzzport",
            "8600",
            "--bzzapi",
            "http://localhost:8545",
            "--corsdomain",
            "http://localhost:8000,http://example.test",
            "--bzzaccount",
            "0xabc",
        ]
    );
}

#[rstest]
fn swarm_arguments_skip_empty_cors_and_account() {
    let settings = LaunchSettings {
        web_server: WebServerConfig {
            enabled: false,
            ..WebServerConfig::default()
        },
        ..LaunchSettings::default()
    };

    let args = TestLauncher::arguments(&request("swarm", settings)).expect("swarm is supported");

    assert_eq!(
        args,
        vec!["--bzzport", "8600", "--bzzapi", "http://localhost:8545"]
    );
}

#[rstest]
fn ipfs_runs_daemon() {
    let args = TestLauncher::arguments(&request("ipfs", LaunchSettings::default()))
        .expect("ipfs is supported");

    assert_eq!(args, vec!["daemon"]);
}

#[rstest]
#[tokio::test]
async fn unknown_kind_is_unsupported() {
    let launcher = launcher("true", ScriptedProbe::new(true));

    let result = launcher
        .launch(&request("arweave", LaunchSettings::default()))
        .await;

    assert!(matches!(
        result,
        Err(LaunchError::UnsupportedKind(kind)) if kind.as_str() == "arweave"
    ));
}

#[rstest]
#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let launcher = launcher("/nonexistent/stowage-node", ScriptedProbe::new(true));

    let result = launcher
        .launch(&request("ipfs", LaunchSettings::default()))
        .await;

    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
}

#[cfg(unix)]
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn process_exiting_before_ready_is_reported() {
    let launcher = launcher("true", ScriptedProbe::new(false));

    let result = launcher
        .launch(&request("ipfs", LaunchSettings::default()))
        .await;

    assert!(matches!(result, Err(LaunchError::ExitedEarly { .. })));
}

#[cfg(unix)]
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_process_times_out_and_is_stopped() {
    let launcher = launcher("yes", ScriptedProbe::new(false));

    let result = launcher
        .launch(&request("ipfs", LaunchSettings::default()))
        .await;

    assert!(matches!(
        result,
        Err(LaunchError::ReadinessTimeout { timeout, .. }) if timeout == Duration::from_millis(200)
    ));
}

#[cfg(unix)]
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ready_process_is_tracked_until_terminated() {
    let launcher = launcher("yes", ScriptedProbe::new(true));

    let launched = launcher
        .launch(&request("ipfs", LaunchSettings::default()))
        .await
        .expect("process should become ready");

    assert!(launched.pid.is_some());
    launcher
        .terminate(launched.id)
        .await
        .expect("termination should succeed");
    launcher
        .terminate(launched.id)
        .await
        .expect("unknown ids are ignored");
}

#[rstest]
fn log_forwarding_follows_bus_events() {
    let bus = EventBus::new();
    let launcher = launcher("true", ScriptedProbe::new(true));
    launcher.attach_log_toggle(&bus).expect("subscribe");

    assert!(!launcher.logs_enabled());
    bus.emit(LOGS_STORAGE_ENABLE, Value::Null);
    assert!(launcher.logs_enabled());
    bus.emit(LOGS_STORAGE_DISABLE, Value::Null);
    assert!(!launcher.logs_enabled());
}

#[rstest]
fn readiness_policy_raises_zero_durations() {
    let policy = ReadinessPolicy::new(Duration::ZERO, Duration::ZERO);

    assert_eq!(policy.timeout(), Duration::from_millis(1));
    assert_eq!(policy.poll(), Duration::from_millis(1));
    assert_eq!(ReadinessPolicy::default().timeout(), Duration::from_secs(30));
}
