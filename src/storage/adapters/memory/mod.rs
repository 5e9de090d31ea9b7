//! In-memory adapters for tests and deterministic local flows.

mod client;
mod launcher;
mod probe;

pub use client::InMemoryStorageClient;
pub use launcher::InMemoryProcessLauncher;
pub use probe::ScriptedProbe;
