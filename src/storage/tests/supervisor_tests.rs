//! Unit tests for reuse-or-launch supervision.

use crate::storage::{
    adapters::memory::{InMemoryProcessLauncher, ScriptedProbe},
    domain::{
        BackendConfig, BackendName, GatewayUrl, LaunchSettings, ProcessHandleId,
        ProcessOwnership, StartupPhase, StorageDomainError,
    },
    ports::{LaunchError, LaunchRequest, LaunchResult, LaunchedProcess, ProcessLauncher},
    services::{ProcessSupervisor, SupervisorError},
};
use async_trait::async_trait;
use mockable::DefaultClock;
use mockall::{mock, predicate::eq};
use rstest::{fixture, rstest};
use std::sync::Arc;

mock! {
    Launcher {}

    #[async_trait]
    impl ProcessLauncher for Launcher {
        async fn launch(&self, request: &LaunchRequest) -> LaunchResult<LaunchedProcess>;
        async fn terminate(&self, id: ProcessHandleId) -> LaunchResult<()>;
    }
}

type MockSupervisor = ProcessSupervisor<ScriptedProbe, MockLauncher, DefaultClock>;

fn swarm() -> BackendName {
    BackendName::new("swarm").expect("valid backend name")
}

#[fixture]
fn gateway() -> GatewayUrl {
    GatewayUrl::explicit("http://localhost:8500").expect("valid gateway")
}

fn supervisor(probe: ScriptedProbe, launcher: MockLauncher) -> MockSupervisor {
    ProcessSupervisor::new(
        swarm(),
        BackendConfig::new("swarm").with_enabled(true),
        Arc::new(probe),
        Arc::new(launcher),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[tokio::test]
async fn reachable_gateway_is_reused_without_launch(gateway: GatewayUrl) {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().never();
    let supervisor = supervisor(ScriptedProbe::new(true), launcher);

    let resolved = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("reachable gateway should be reused");

    assert!(!resolved.started);
    assert_eq!(resolved.handle.ownership(), ProcessOwnership::External);
    assert_eq!(supervisor.phase().await, StartupPhase::Ready);
}

#[rstest]
#[tokio::test]
async fn unreachable_gateway_launches_exactly_once(gateway: GatewayUrl) {
    let id = ProcessHandleId::new();
    let expected_gateway = gateway.clone();
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .withf(move |request| {
            request.kind.as_str() == "swarm" && request.gateway == expected_gateway
        })
        .times(1)
        .returning(move |_| Ok(LaunchedProcess { id, pid: Some(4242) }));
    let supervisor = supervisor(ScriptedProbe::new(false), launcher);

    let resolved = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("launch should succeed");

    assert!(resolved.started);
    assert_eq!(resolved.handle.id(), id);
    assert_eq!(resolved.handle.pid(), Some(4242));
    assert_eq!(resolved.handle.ownership(), ProcessOwnership::Spawned);
}

#[rstest]
#[tokio::test]
async fn probe_error_counts_as_unreachable(gateway: GatewayUrl) {
    let probe = ScriptedProbe::new(true);
    probe.push_failure("connection refused");
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().times(1).returning(|_| {
        Ok(LaunchedProcess {
            id: ProcessHandleId::new(),
            pid: None,
        })
    });
    let supervisor = supervisor(probe, launcher);

    let resolved = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("launch should succeed");

    assert!(resolved.started);
}

#[rstest]
#[tokio::test]
async fn launch_failure_propagates_and_resets_phase(gateway: GatewayUrl) {
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().times(1).returning(|request| {
        Err(LaunchError::Spawn {
            kind: request.kind.clone(),
            reason: "not installed".to_owned(),
        })
    });
    let supervisor = supervisor(ScriptedProbe::new(false), launcher);

    let result = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await;

    assert!(matches!(
        result,
        Err(SupervisorError::Launch(LaunchError::Spawn { .. }))
    ));
    assert_eq!(supervisor.phase().await, StartupPhase::Init);
    assert!(supervisor.handle().await.is_none());
}

#[rstest]
#[tokio::test]
async fn resolved_handle_is_returned_without_probing_again(gateway: GatewayUrl) {
    let probe = ScriptedProbe::new(true);
    let mut launcher = MockLauncher::new();
    launcher.expect_launch().never();
    let supervisor = supervisor(probe.clone(), launcher);

    let first = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("first call should succeed");
    let second = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("second call should succeed");

    assert_eq!(first.handle, second.handle);
    assert!(!second.started);
    assert_eq!(probe.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn mark_started_requires_ready_backend(gateway: GatewayUrl) {
    let supervisor = supervisor(ScriptedProbe::new(true), MockLauncher::new());

    let early = supervisor.mark_started().await;
    assert!(matches!(
        early,
        Err(SupervisorError::Domain(
            StorageDomainError::InvalidStartupTransition { .. }
        ))
    ));

    supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("reuse should succeed");
    supervisor.mark_started().await.expect("ready backend starts");
    supervisor.mark_started().await.expect("repeat is harmless");
    assert_eq!(supervisor.phase().await, StartupPhase::Started);
}

#[rstest]
#[tokio::test]
async fn release_terminates_spawned_process_once(gateway: GatewayUrl) {
    let id = ProcessHandleId::new();
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .times(1)
        .returning(move |_| Ok(LaunchedProcess { id, pid: None }));
    launcher
        .expect_terminate()
        .with(eq(id))
        .times(1)
        .returning(|_| Ok(()));
    let supervisor = supervisor(ScriptedProbe::new(false), launcher);
    supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("launch should succeed");

    assert!(supervisor.release().await.expect("first release"));
    assert!(!supervisor.release().await.expect("second release"));
    assert_eq!(supervisor.phase().await, StartupPhase::Init);
}

#[rstest]
#[tokio::test]
async fn release_leaves_external_backend_running(gateway: GatewayUrl) {
    let mut launcher = MockLauncher::new();
    launcher.expect_terminate().never();
    let supervisor = supervisor(ScriptedProbe::new(true), launcher);
    supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("reuse should succeed");

    assert!(!supervisor.release().await.expect("release"));
}

#[rstest]
#[tokio::test]
async fn release_before_resolution_is_a_no_op() {
    let mut launcher = MockLauncher::new();
    launcher.expect_terminate().never();
    let supervisor = supervisor(ScriptedProbe::new(true), launcher);

    assert!(!supervisor.release().await.expect("release"));
}

#[rstest]
#[tokio::test]
async fn in_memory_launcher_brings_gateway_online(gateway: GatewayUrl) {
    let probe = ScriptedProbe::new(false);
    let launcher = Arc::new(InMemoryProcessLauncher::new().with_gateway(probe.clone()));
    let supervisor = ProcessSupervisor::new(
        swarm(),
        BackendConfig::new("swarm"),
        Arc::new(probe.clone()),
        Arc::clone(&launcher),
        Arc::new(DefaultClock),
    );

    let resolved = supervisor
        .ensure_running(&gateway, &LaunchSettings::default())
        .await
        .expect("launch should succeed");
    assert!(launcher.is_running(resolved.handle.id()));
    assert_eq!(launcher.launches().len(), 1);

    supervisor.release().await.expect("release");
    assert_eq!(launcher.terminated(), vec![resolved.handle.id()]);
    assert!(!launcher.is_running(resolved.handle.id()));
}
