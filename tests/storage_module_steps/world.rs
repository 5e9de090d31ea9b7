//! Shared world state for storage module BDD scenarios.

use std::sync::{Arc, Mutex};

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use stowage::bus::{BusError, EventBus};
use stowage::storage::{
    adapters::memory::{InMemoryProcessLauncher, InMemoryStorageClient, ScriptedProbe},
    domain::{BackendConfig, BackendName},
    ports::StorageClient,
    services::{StorageModule, StorageModuleDeps, StorageModuleHandle, UploadProviderRegistry},
};

/// Handle type produced by the module under test.
pub type TestHandle = StorageModuleHandle<ScriptedProbe, InMemoryProcessLauncher, DefaultClock>;

/// Events the world records as they are emitted.
const RECORDED: [&str; 2] = ["swarm:process:started", "swarm:config:warning"];

/// Scenario world for storage module behaviour tests.
pub struct StorageWorld {
    /// Session bus shared with the module.
    pub bus: Arc<EventBus>,
    /// Gateway probe; launching through the in-memory launcher flips it online.
    pub probe: ScriptedProbe,
    /// In-memory launcher recording launches and terminations.
    pub launcher: InMemoryProcessLauncher,
    /// Backend configuration used by the next start.
    pub config: Option<BackendConfig>,
    /// Handle of the started module.
    pub handle: Option<TestHandle>,
    /// Result of the last console command.
    pub console_reply: Option<Result<String, BusError>>,
    events: Arc<Mutex<Vec<(String, Value)>>>,
}

impl StorageWorld {
    /// Creates a world with an unreachable gateway and no configuration.
    ///
    /// # Panics
    ///
    /// Panics when the event recorders cannot subscribe to a fresh bus.
    #[must_use]
    pub fn new() -> Self {
        let bus = Arc::new(EventBus::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        for name in RECORDED {
            let log = Arc::clone(&events);
            bus.on(name, move |event| {
                if let Ok(mut entries) = log.lock() {
                    entries.push((event.name().to_owned(), event.payload().clone()));
                }
                Ok(())
            })
            .expect("fresh bus accepts subscribers");
        }
        let probe = ScriptedProbe::new(false);
        Self {
            bus,
            launcher: InMemoryProcessLauncher::new().with_gateway(probe.clone()),
            probe,
            config: None,
            handle: None,
            console_reply: None,
            events,
        }
    }

    /// Builds the module for the pending configuration.
    pub fn module(
        &self,
    ) -> Result<StorageModule<ScriptedProbe, InMemoryProcessLauncher, DefaultClock>, eyre::Report>
    {
        let config = self
            .config
            .clone()
            .ok_or_else(|| eyre::eyre!("no backend configuration in scenario world"))?;
        let backend = BackendName::new("swarm").map_err(|err| eyre::eyre!("{err}"))?;
        Ok(StorageModule::new(
            backend,
            config,
            StorageModuleDeps {
                bus: Arc::clone(&self.bus),
                probe: Arc::new(self.probe.clone()),
                launcher: Arc::new(self.launcher.clone()),
                clock: Arc::new(DefaultClock),
                client: Arc::new(InMemoryStorageClient::new()) as Arc<dyn StorageClient>,
                uploads: Arc::new(UploadProviderRegistry::new()),
            },
        ))
    }

    /// Returns the payloads recorded for `name`.
    pub fn events_named(&self, name: &str) -> Result<Vec<Value>, eyre::Report> {
        let entries = self
            .events
            .lock()
            .map_err(|_| eyre::eyre!("event log lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, payload)| payload.clone())
            .collect())
    }
}

impl Default for StorageWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StorageWorld {
    StorageWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
