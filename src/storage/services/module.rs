//! Orchestration of one storage backend on the bus.

use super::{
    GatewayUploadProvider, ProcessSupervisor, SupervisedBackend, SupervisorError,
    SupervisorResult, UploadProviderRegistry,
};
use crate::bus::{
    BusError, CommandError, CommandHandler, ConsoleCommand, ConsoleHandler, ConsoleMatcher,
    EventBus, RegistrationBatch,
};
use crate::health::{
    MonitorSubscription, ServiceCheck, ServiceCheckReport, ServiceState, ServiceStatus,
    StatusWatch,
};
use crate::storage::{
    domain::{
        BackendConfig, BackendEvents, BackendName, ConfigGate, ConfigWarning, ConfigurationError,
        DisabledReason, GateDecision, GatewayUrl, LOGS_STORAGE_DISABLE, LOGS_STORAGE_ENABLE,
        LaunchSettings, ProcessStarted, RUNCODE_REGISTER, RunContext,
    },
    ports::{AvailabilityProbe, ProcessLauncher, StorageClient, UploadError},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Collaborators a [`StorageModule`] is wired with.
pub struct StorageModuleDeps<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    /// Session bus.
    pub bus: Arc<EventBus>,
    /// Gateway availability probe.
    pub probe: Arc<P>,
    /// Backend process launcher.
    pub launcher: Arc<L>,
    /// Clock stamping process handles.
    pub clock: Arc<C>,
    /// Storage network client used by the upload provider.
    pub client: Arc<dyn StorageClient>,
    /// Session upload provider registry.
    pub uploads: Arc<UploadProviderRegistry>,
}

/// How startup ended.
#[derive(Debug, Clone)]
pub enum StartupOutcome {
    /// The backend is switched off by configuration.
    Disabled(DisabledReason),
    /// The backend is wanted but could not be wired up.
    NotStarted(ConfigurationError),
    /// A backend is running.
    Running(SupervisedBackend),
    /// Launching the backend failed.
    Failed(SupervisorError),
}

impl StartupOutcome {
    /// Returns whether a backend is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// One storage backend: gate, supervisor, health check and bus surface.
pub struct StorageModule<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    backend: BackendName,
    config: BackendConfig,
    contexts: Vec<RunContext>,
    settings: LaunchSettings,
    deps: StorageModuleDeps<P, L, C>,
}

impl<P, L, C> StorageModule<P, L, C>
where
    P: AvailabilityProbe + 'static,
    L: ProcessLauncher + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a module for `backend` running in the `run` context.
    #[must_use]
    pub fn new(
        backend: BackendName,
        config: BackendConfig,
        deps: StorageModuleDeps<P, L, C>,
    ) -> Self {
        Self {
            backend,
            config,
            contexts: vec![RunContext::Run],
            settings: LaunchSettings::default(),
            deps,
        }
    }

    /// Replaces the run contexts the gate evaluates.
    #[must_use]
    pub fn with_contexts(mut self, contexts: impl IntoIterator<Item = RunContext>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }

    /// Replaces the web server, blockchain and CORS settings.
    #[must_use]
    pub fn with_launch_settings(mut self, settings: LaunchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the startup sequence.
    ///
    /// Every path emits `<backend>:process:started` exactly once, after all
    /// of this backend's bus registrations.
    pub async fn start(self) -> StorageModuleHandle<P, L, C> {
        let events = BackendEvents::new(self.backend.clone());
        let gate = ConfigGate::new(self.backend.clone(), self.contexts.iter().copied());

        match gate.decide(&self.config) {
            GateDecision::Disabled(reason) => self.start_disabled(&events, reason),
            GateDecision::NotStarted(err) => self.not_started(&events, err),
            GateDecision::Proceed(gateway) => self.start_enabled(&events, gateway).await,
        }
    }

    fn start_disabled(
        self,
        events: &BackendEvents,
        reason: DisabledReason,
    ) -> StorageModuleHandle<P, L, C> {
        let bus = &self.deps.bus;
        info!(backend = %self.backend, %reason, "storage backend disabled");
        let notice = ConsoleCommand::new(
            ConsoleMatcher::word(self.backend.as_str()),
            Arc::new(DisabledNotice::new(&self.backend)),
        );
        if let Err(err) = bus.register_console_command(notice) {
            warn!(backend = %self.backend, error = %err, "failed to register console notice");
        }
        bus.emit(&events.process_started(), ProcessStarted::ok(false).to_payload());
        StorageModuleHandle::inert(StartupOutcome::Disabled(reason))
    }

    fn not_started(
        self,
        events: &BackendEvents,
        err: ConfigurationError,
    ) -> StorageModuleHandle<P, L, C> {
        let bus = &self.deps.bus;
        let warning = ConfigWarning::from(&err);
        warn!(
            backend = %self.backend,
            keys = ?warning.keys,
            "{} module will not be loaded: {}",
            self.backend.display_name(),
            warning.message
        );
        bus.emit(&events.config_warning(), warning.to_payload());
        let started = match &err {
            ConfigurationError::UnresolvableGateway { .. } => ProcessStarted::ok(false),
            ConfigurationError::DuplicateRegistration(_)
            | ConfigurationError::Registration(_)
            | ConfigurationError::DuplicateUploadProvider(_)
            | ConfigurationError::UploadRegistration(_) => ProcessStarted::failed(err.to_string()),
        };
        bus.emit(&events.process_started(), started.to_payload());
        StorageModuleHandle::inert(StartupOutcome::NotStarted(err))
    }

    async fn start_enabled(
        self,
        events: &BackendEvents,
        gateway: GatewayUrl,
    ) -> StorageModuleHandle<P, L, C> {
        let subscription = match self.register_surface(events, &gateway) {
            Ok(subscription) => subscription,
            Err(err) => return self.not_started(events, err),
        };

        let supervisor = Arc::new(ProcessSupervisor::new(
            self.backend.clone(),
            self.config.clone(),
            Arc::clone(&self.deps.probe),
            Arc::clone(&self.deps.launcher),
            Arc::clone(&self.deps.clock),
        ));
        let bus = &self.deps.bus;

        let outcome = match supervisor.ensure_running(&gateway, &self.settings).await {
            Ok(resolved) => {
                bus.emit(
                    RUNCODE_REGISTER,
                    json!({ "name": self.backend.as_str(), "gateway": gateway.as_str() }),
                );
                bus.emit(
                    &events.process_started(),
                    ProcessStarted::ok(resolved.started).to_payload(),
                );
                if let Err(err) = supervisor.mark_started().await {
                    warn!(backend = %self.backend, error = %err, "unexpected startup phase");
                }
                StartupOutcome::Running(resolved)
            }
            Err(err) => {
                bus.emit(
                    &events.process_started(),
                    ProcessStarted::failed(err.to_string()).to_payload(),
                );
                StartupOutcome::Failed(err)
            }
        };

        let status = subscription.as_ref().map_or_else(
            || StatusWatch::fixed(ServiceStatus::Unknown),
            MonitorSubscription::status,
        );
        StorageModuleHandle {
            outcome,
            status,
            subscription,
            supervisor: Some(supervisor),
            gateway: Some(gateway),
        }
    }

    /// Registers the health check, upload provider, listeners, commands and
    /// console commands.
    ///
    /// Either everything is registered or nothing stays registered: bus
    /// entries are committed as one batch after the health check and upload
    /// provider, and those two are withdrawn when a later step fails.
    fn register_surface(
        &self,
        events: &BackendEvents,
        gateway: &GatewayUrl,
    ) -> Result<Option<MonitorSubscription>, ConfigurationError> {
        let bus = &self.deps.bus;
        let name = events.service_name();

        let check = Arc::new(ProbeServiceCheck::new(
            name.clone(),
            gateway.clone(),
            Arc::clone(&self.deps.probe),
        ));
        let subscription = match bus.register_service(&name, check) {
            Ok(subscription) => Some(subscription),
            Err(BusError::NoServiceRegistrar) => {
                warn!(service = %name, "no health monitor installed; status stays unknown");
                None
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = self.register_upload_provider(gateway) {
            cancel(subscription.as_ref());
            return Err(err);
        }

        if let Err(err) = bus.commit(self.surface(events)) {
            cancel(subscription.as_ref());
            self.withdraw_upload_provider();
            return Err(err.into());
        }
        debug!(backend = %self.backend, "registered storage commands");
        Ok(subscription)
    }

    fn register_upload_provider(&self, gateway: &GatewayUrl) -> Result<(), ConfigurationError> {
        let provider = Arc::new(GatewayUploadProvider::new(
            gateway.clone(),
            Arc::clone(&self.deps.client),
        ));
        self.deps
            .uploads
            .register_upload_command(self.backend.as_str(), provider)
            .map_err(|err| match err {
                UploadError::DuplicateProvider(name) => {
                    ConfigurationError::DuplicateUploadProvider(name)
                }
                other => ConfigurationError::UploadRegistration(other.to_string()),
            })
    }

    fn withdraw_upload_provider(&self) {
        if let Err(err) = self.deps.uploads.unregister(self.backend.as_str()) {
            warn!(backend = %self.backend, error = %err, "failed to withdraw upload provider");
        }
    }

    /// Stages the listeners, log commands and console commands.
    fn surface(&self, events: &BackendEvents) -> RegistrationBatch {
        let name = events.service_name();
        let display = self.backend.display_name();
        let enable = events.logs_enable_command();
        let disable = events.logs_disable_command();
        let detected = format!("{name} node detected...");
        let offline = format!("{name} node is offline...");

        RegistrationBatch::new()
            .on(events.back_online(), move |_| {
                info!("{detected}");
                Ok(())
            })
            .on(events.went_offline(), move |_| {
                info!("{offline}");
                Ok(())
            })
            .command(
                enable.clone(),
                Arc::new(LogToggleCommand::new(
                    LOGS_STORAGE_ENABLE,
                    format!("Enabling {display} logs"),
                )),
            )
            .command(
                disable.clone(),
                Arc::new(LogToggleCommand::new(
                    LOGS_STORAGE_DISABLE,
                    format!("Disabling {display} logs"),
                )),
            )
            .console(ConsoleCommand::new(
                ConsoleMatcher::exact([events.console_log_on()]),
                Arc::new(ForwardToCommand::new(enable)),
            ))
            .console(ConsoleCommand::new(
                ConsoleMatcher::exact([events.console_log_off()]),
                Arc::new(ForwardToCommand::new(disable)),
            ))
    }
}

fn cancel(subscription: Option<&MonitorSubscription>) {
    if let Some(active) = subscription {
        active.cancel();
    }
}

/// What a started [`StorageModule`] leaves behind.
pub struct StorageModuleHandle<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    outcome: StartupOutcome,
    status: StatusWatch,
    subscription: Option<MonitorSubscription>,
    supervisor: Option<Arc<ProcessSupervisor<P, L, C>>>,
    gateway: Option<GatewayUrl>,
}

impl<P, L, C> StorageModuleHandle<P, L, C>
where
    P: AvailabilityProbe,
    L: ProcessLauncher,
    C: Clock + Send + Sync,
{
    fn inert(outcome: StartupOutcome) -> Self {
        Self {
            outcome,
            status: StatusWatch::fixed(ServiceStatus::Disabled),
            subscription: None,
            supervisor: None,
            gateway: None,
        }
    }

    /// Returns how startup ended.
    #[must_use]
    pub const fn outcome(&self) -> &StartupOutcome {
        &self.outcome
    }

    /// Returns a read-only view of the backend's health status.
    #[must_use]
    pub fn status(&self) -> StatusWatch {
        self.status.clone()
    }

    /// Returns the resolved gateway, when the gate let the backend proceed.
    #[must_use]
    pub const fn gateway(&self) -> Option<&GatewayUrl> {
        self.gateway.as_ref()
    }

    /// Returns the supervisor, when the gate let the backend proceed.
    #[must_use]
    pub const fn supervisor(&self) -> Option<&Arc<ProcessSupervisor<P, L, C>>> {
        self.supervisor.as_ref()
    }

    /// Stops health polling and terminates the backend if this session
    /// spawned it.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError`] when terminating the owned process fails.
    pub async fn shutdown(&self) -> SupervisorResult<()> {
        if let Some(subscription) = &self.subscription {
            subscription.cancel();
        }
        if let Some(supervisor) = &self.supervisor {
            supervisor.release().await?;
        }
        Ok(())
    }
}

/// Health check answering through the availability probe.
pub struct ProbeServiceCheck<P>
where
    P: AvailabilityProbe + ?Sized,
{
    name: String,
    gateway: GatewayUrl,
    probe: Arc<P>,
}

impl<P> ProbeServiceCheck<P>
where
    P: AvailabilityProbe + ?Sized,
{
    /// Creates a check reporting as `name`.
    #[must_use]
    pub const fn new(name: String, gateway: GatewayUrl, probe: Arc<P>) -> Self {
        Self {
            name,
            gateway,
            probe,
        }
    }
}

#[async_trait]
impl<P> ServiceCheck for ProbeServiceCheck<P>
where
    P: AvailabilityProbe + ?Sized + 'static,
{
    async fn check(&self) -> ServiceCheckReport {
        trace!("Checking {} availability on {}...", self.name, self.gateway);
        let state = match self.probe.is_available(&self.gateway).await {
            Ok(available) => {
                trace!(
                    "{} {}available",
                    self.name,
                    if available { "" } else { "un" }
                );
                ServiceState::from_available(available)
            }
            Err(err) => {
                trace!("Check {} availability error: {err}", self.name);
                ServiceState::Off
            }
        };
        ServiceCheckReport::new(self.name.clone(), state)
    }
}

/// `logs:<backend>:enable|disable` handler.
#[derive(Debug, Clone)]
pub struct LogToggleCommand {
    event: &'static str,
    reply: String,
}

impl LogToggleCommand {
    /// Creates a handler emitting `event` and answering `reply`.
    #[must_use]
    pub const fn new(event: &'static str, reply: String) -> Self {
        Self { event, reply }
    }
}

#[async_trait]
impl CommandHandler for LogToggleCommand {
    async fn handle(&self, bus: &EventBus, _args: Value) -> Result<Value, CommandError> {
        bus.emit(self.event, Value::Null);
        Ok(Value::String(self.reply.clone()))
    }
}

/// Console command forwarding to a request handler.
#[derive(Debug, Clone)]
pub struct ForwardToCommand {
    command: String,
}

impl ForwardToCommand {
    /// Creates a console handler that requests `command`.
    #[must_use]
    pub const fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl ConsoleHandler for ForwardToCommand {
    async fn process(&self, bus: &EventBus, _input: &str) -> Result<String, CommandError> {
        let reply = bus
            .request(&self.command, Value::Null)
            .await
            .map_err(|err| CommandError::new(err.to_string()))?;
        Ok(match reply {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

/// Console fallback explaining that a backend is switched off.
#[derive(Debug, Clone)]
pub struct DisabledNotice {
    message: String,
}

impl DisabledNotice {
    /// Creates the notice for `backend`.
    #[must_use]
    pub fn new(backend: &BackendName) -> Self {
        Self {
            message: format!(
                "{} is disabled or not configured. Enable it in the storage configuration.",
                backend.display_name()
            ),
        }
    }
}

#[async_trait]
impl ConsoleHandler for DisabledNotice {
    async fn process(&self, _bus: &EventBus, _input: &str) -> Result<String, CommandError> {
        warn!("{}", self.message);
        Ok(self.message.clone())
    }
}
