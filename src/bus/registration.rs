//! Registrations staged and committed to the bus in one step.

use super::{BusEvent, CommandError, CommandHandler, ConsoleCommand, EventHandler};
use std::fmt;
use std::sync::Arc;

/// Listeners, request handlers and console commands that become visible
/// together or not at all.
///
/// Build the batch with the chained methods and hand it to
/// [`super::EventBus::commit`].
#[derive(Default)]
pub struct RegistrationBatch {
    pub(super) listeners: Vec<(String, EventHandler)>,
    pub(super) commands: Vec<(String, Arc<dyn CommandHandler>)>,
    pub(super) console: Vec<ConsoleCommand>,
}

impl RegistrationBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an event listener.
    #[must_use]
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&BusEvent) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.listeners.push((event.into(), Arc::new(handler)));
        self
    }

    /// Stages a request handler.
    #[must_use]
    pub fn command(mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.commands.push((name.into(), handler));
        self
    }

    /// Stages a console command; batch order is kept in the match list.
    #[must_use]
    pub fn console(mut self, command: ConsoleCommand) -> Self {
        self.console.push(command);
        self
    }
}

impl fmt::Debug for RegistrationBatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegistrationBatch")
            .field(
                "listeners",
                &self.listeners.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field(
                "commands",
                &self.commands.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("console", &self.console)
            .finish()
    }
}
