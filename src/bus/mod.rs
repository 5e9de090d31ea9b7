//! Process-wide event and command bus.
//!
//! The bus binds the storage supervisor to its host application:
//!
//! - publish/subscribe events ([`EventBus::on`], [`EventBus::emit`])
//! - one-to-one request handlers ([`EventBus::set_command_handler`],
//!   [`EventBus::request`])
//! - first-match console commands ([`EventBus::register_console_command`],
//!   [`EventBus::run_console_command`])
//! - all-or-nothing registration of a component's surface
//!   ([`RegistrationBatch`], [`EventBus::commit`])
//! - the typed `services:register` facility backed by the health monitor
//!   ([`EventBus::register_service`])
//!
//! The host constructs exactly one [`EventBus`], shares it by `Arc` with every
//! component, and calls [`EventBus::shutdown`] when the session ends.

mod command;
mod console;
mod error;
mod event;
mod registration;
mod service;

pub use command::CommandHandler;
pub use console::{ConsoleCommand, ConsoleHandler, ConsoleMatcher};
pub use error::{BusError, BusResult, CommandError};
pub use event::{BusEvent, EventHandler};
pub use registration::RegistrationBatch;
pub use service::{EventBus, SERVICES_REGISTER};

#[cfg(test)]
mod tests;
