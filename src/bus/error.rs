//! Error types for bus registration and dispatch.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors returned by [`super::EventBus`] operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// A request handler with the same name is already registered.
    #[error("command handler already registered: {0}")]
    DuplicateCommandHandler(String),

    /// No request handler is registered under the requested name.
    #[error("no command handler registered for {0}")]
    UnknownCommand(String),

    /// No console command pattern matched the input.
    #[error("no console command matches '{0}'")]
    NoMatchingConsoleCommand(String),

    /// A service with the same name is already being checked.
    #[error("service already registered: {0}")]
    DuplicateService(String),

    /// A service registrar has already been installed on this bus.
    #[error("a service registrar is already installed")]
    RegistrarAlreadyInstalled,

    /// `services:register` was requested before any registrar was installed.
    #[error("no service registrar is installed")]
    NoServiceRegistrar,

    /// The bus has been torn down for this session.
    #[error("event bus has been shut down")]
    ShutDown,

    /// A handler reported a failure.
    #[error(transparent)]
    Handler(#[from] CommandError),

    /// A background task could not be scheduled.
    #[error("bus runtime error: {0}")]
    Runtime(String),

    /// Internal state lock was poisoned by a panicking writer.
    #[error("event bus state lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Failure reported by an event, request or console handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandError(String);

impl CommandError {
    /// Creates a handler error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}
