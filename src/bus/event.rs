//! Published events and their subscriber callbacks.

use super::CommandError;
use serde_json::Value;
use std::sync::Arc;

/// A named event delivered to every subscriber of that name.
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    name: String,
    payload: Value,
}

impl BusEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the event payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Subscriber callback invoked synchronously for each matching event.
pub type EventHandler = Arc<dyn Fn(&BusEvent) -> Result<(), CommandError> + Send + Sync>;
