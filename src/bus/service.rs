//! The session-wide bus service.

use super::{
    BusError, BusEvent, BusResult, CommandError, CommandHandler, ConsoleCommand, EventHandler,
    RegistrationBatch,
};
use crate::health::{MonitorSubscription, ServiceCheck, ServiceRegistrar};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

/// Request name under which health checks are registered.
///
/// [`EventBus::register_service`] is the typed form of this request.
pub const SERVICES_REGISTER: &str = "services:register";

#[derive(Default)]
struct BusState {
    listeners: HashMap<String, Vec<EventHandler>>,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    console: Vec<ConsoleCommand>,
    registrar: Option<Arc<dyn ServiceRegistrar>>,
    shut_down: bool,
}

/// Publish/subscribe and request/response channel shared by all components.
///
/// Registrations are additive for the lifetime of a session; nothing is
/// unregistered until [`EventBus::shutdown`] clears every table.
#[derive(Default)]
pub struct EventBus {
    state: RwLock<BusState>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> BusResult<RwLockReadGuard<'_, BusState>> {
        self.state
            .read()
            .map_err(|err| BusError::LockPoisoned(err.to_string()))
    }

    fn write_state(&self) -> BusResult<RwLockWriteGuard<'_, BusState>> {
        let state = self
            .state
            .write()
            .map_err(|err| BusError::LockPoisoned(err.to_string()))?;
        if state.shut_down {
            return Err(BusError::ShutDown);
        }
        Ok(state)
    }

    /// Subscribes `handler` to events named `event`.
    ///
    /// Handlers run in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ShutDown`] after teardown.
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> BusResult<()>
    where
        F: Fn(&BusEvent) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        let name = event.into();
        trace!(event = %name, "subscribing event handler");
        self.write_state()?
            .listeners
            .entry(name)
            .or_default()
            .push(Arc::new(handler));
        Ok(())
    }

    /// Emits an event to every subscriber of `event`.
    ///
    /// A handler that fails or panics is logged and skipped; later handlers
    /// still run. Returns the number of handlers that completed successfully.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let handlers = match self.read_state() {
            Ok(state) if state.shut_down => {
                trace!(event, "dropping event emitted after bus shutdown");
                return 0;
            }
            Ok(state) => state.listeners.get(event).cloned().unwrap_or_default(),
            Err(err) => {
                warn!(event, error = %err, "dropping event");
                return 0;
            }
        };

        let bus_event = BusEvent::new(event, payload);
        let mut delivered = 0;
        for handler in &handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&bus_event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => warn!(event, error = %err, "event handler failed"),
                Err(_) => warn!(event, "event handler panicked"),
            }
        }
        delivered
    }

    /// Registers the single handler for requests named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateCommandHandler`] when `name` already has
    /// a handler; the existing handler stays active.
    pub fn set_command_handler(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> BusResult<()> {
        let command = name.into();
        let mut state = self.write_state()?;
        if state.commands.contains_key(&command) {
            return Err(BusError::DuplicateCommandHandler(command));
        }
        debug!(command = %command, "registered command handler");
        state.commands.insert(command, handler);
        Ok(())
    }

    /// Returns whether a request handler is registered for `name`.
    #[must_use]
    pub fn has_command_handler(&self, name: &str) -> bool {
        self.read_state()
            .is_ok_and(|state| state.commands.contains_key(name))
    }

    /// Sends a request to the handler registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownCommand`] when no handler exists,
    /// [`BusError::Handler`] when the handler fails, or
    /// [`BusError::ShutDown`] after teardown.
    pub async fn request(&self, name: &str, args: Value) -> BusResult<Value> {
        let handler = {
            let state = self.read_state()?;
            if state.shut_down {
                return Err(BusError::ShutDown);
            }
            state
                .commands
                .get(name)
                .cloned()
                .ok_or_else(|| BusError::UnknownCommand(name.to_owned()))?
        };
        trace!(command = name, "dispatching request");
        Ok(handler.handle(self, args).await?)
    }

    /// Appends a console command to the ordered match list.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ShutDown`] after teardown.
    pub fn register_console_command(&self, command: ConsoleCommand) -> BusResult<()> {
        debug!(matcher = ?command.matcher(), "registered console command");
        self.write_state()?.console.push(command);
        Ok(())
    }

    /// Runs the first registered console command whose matcher claims
    /// `input`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoMatchingConsoleCommand`] when nothing matches or
    /// [`BusError::Handler`] when the matched command fails.
    pub async fn run_console_command(&self, input: &str) -> BusResult<String> {
        let handler = {
            let state = self.read_state()?;
            if state.shut_down {
                return Err(BusError::ShutDown);
            }
            state
                .console
                .iter()
                .find(|command| command.matches(input))
                .map(ConsoleCommand::handler)
                .ok_or_else(|| BusError::NoMatchingConsoleCommand(input.to_owned()))?
        };
        Ok(handler.process(self, input).await?)
    }

    /// Registers every staged listener, request handler and console command
    /// under one lock.
    ///
    /// Nothing is registered when any request name is already taken or
    /// staged twice.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateCommandHandler`] for the first colliding
    /// request name, or [`BusError::ShutDown`] after teardown.
    pub fn commit(&self, batch: RegistrationBatch) -> BusResult<()> {
        let mut state = self.write_state()?;
        {
            let mut staged = HashSet::with_capacity(batch.commands.len());
            for (name, _) in &batch.commands {
                if state.commands.contains_key(name) || !staged.insert(name.as_str()) {
                    return Err(BusError::DuplicateCommandHandler(name.clone()));
                }
            }
        }

        let RegistrationBatch {
            listeners,
            commands,
            console,
        } = batch;
        debug!(
            listeners = listeners.len(),
            commands = commands.len(),
            console_commands = console.len(),
            "committed registration batch"
        );
        for (event, handler) in listeners {
            state.listeners.entry(event).or_default().push(handler);
        }
        state.commands.extend(commands);
        state.console.extend(console);
        Ok(())
    }

    /// Installs the health aggregator answering `services:register`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::RegistrarAlreadyInstalled`] when a registrar is
    /// already present.
    pub fn set_service_registrar(&self, registrar: Arc<dyn ServiceRegistrar>) -> BusResult<()> {
        let mut state = self.write_state()?;
        if state.registrar.is_some() {
            return Err(BusError::RegistrarAlreadyInstalled);
        }
        state.registrar = Some(registrar);
        Ok(())
    }

    /// Registers a named health check with the installed registrar.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoServiceRegistrar`] when no registrar is
    /// installed, or the registrar's own error (for example
    /// [`BusError::DuplicateService`]).
    pub fn register_service(
        &self,
        name: &str,
        check: Arc<dyn ServiceCheck>,
    ) -> BusResult<MonitorSubscription> {
        let registrar = {
            let state = self.read_state()?;
            if state.shut_down {
                return Err(BusError::ShutDown);
            }
            state
                .registrar
                .clone()
                .ok_or(BusError::NoServiceRegistrar)?
        };
        trace!(request = SERVICES_REGISTER, service = name, "registering service check");
        registrar.register_service(name, check)
    }

    /// Tears the bus down: clears every table and rejects later use.
    ///
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.shut_down {
            return;
        }
        state.listeners.clear();
        state.commands.clear();
        state.console.clear();
        state.registrar = None;
        state.shut_down = true;
        debug!("event bus shut down");
    }

    /// Returns whether [`EventBus::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.read_state().map_or(true, |state| state.shut_down)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct("EventBus");
        if let Ok(state) = self.state.read() {
            debug
                .field("events", &state.listeners.len())
                .field("commands", &state.commands.len())
                .field("console_commands", &state.console.len())
                .field("shut_down", &state.shut_down);
        }
        debug.finish_non_exhaustive()
    }
}
