//! Storage backend supervision.
//!
//! This module decides whether a storage backend behind a network gateway
//! should run at all, reuses an already reachable backend or launches one,
//! registers the backend's health check, commands, console surface and
//! upload provider on the bus, and releases what it owns at shutdown. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
