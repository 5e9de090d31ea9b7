//! Stowage: pluggable storage-backend supervisor.
//!
//! This crate decides whether an external storage backend reachable through
//! a network gateway is already running, launches a local instance when it is
//! not, keeps tracking its availability, and exposes that status plus a
//! command surface to the host application through a shared event and
//! command bus.
//!
//! # Architecture
//!
//! Stowage follows hexagonal architecture principles:
//!
//! - **Domain**: configuration gating, gateway resolution, process handles
//!   and status state machines with no infrastructure dependencies
//! - **Ports**: abstract trait interfaces for probing, launching and
//!   uploading
//! - **Adapters**: concrete implementations of ports (HTTP, child
//!   processes, in-memory fakes)
//!
//! # Modules
//!
//! - [`bus`]: process-wide event, command and console bus
//! - [`health`]: de-bounced availability monitoring
//! - [`storage`]: configuration gate, process supervision, uploads and the
//!   storage module orchestrator
//! - [`config`]: settings file loading

pub mod bus;
pub mod config;
pub mod health;
pub mod storage;
