//! Request/response command handler contract.

use super::{CommandError, EventBus};
use async_trait::async_trait;
use serde_json::Value;

/// Handler answering requests for exactly one command name.
///
/// The handler receives the bus it was dispatched from so it can emit events
/// or issue further requests without holding its own bus reference.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handles a request and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the command cannot be completed.
    async fn handle(&self, bus: &EventBus, args: Value) -> Result<Value, CommandError>;
}
