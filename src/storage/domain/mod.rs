//! Domain model for storage backend supervision.
//!
//! The storage domain models validated backend configuration, gateway URL
//! resolution, the configuration gate, process ownership and startup phases,
//! and the bus event vocabulary. Infrastructure concerns remain outside this
//! boundary.

mod config;
mod error;
mod events;
mod gate;
mod gateway;
mod launch;
mod name;
mod process;
mod upload;

pub use config::{
    BackendConfig, DappConnection, Protocol, RawDappConnection, RawStorageConfig,
    RawUploadSection, RunContext,
};
pub use error::{ConfigurationError, StorageDomainError};
pub use events::{
    BackendEvents, ConfigWarning, LOGS_STORAGE_DISABLE, LOGS_STORAGE_ENABLE, ProcessStarted,
    RUNCODE_REGISTER,
};
pub use gate::{ConfigGate, DisabledReason, GateDecision};
pub use gateway::{DEFAULT_GET_PATH, GatewayUrl};
pub use launch::{BlockchainConfig, LaunchSettings, WebServerConfig};
pub use name::BackendName;
pub use process::{ProcessHandle, ProcessHandleId, ProcessOwnership, StartupPhase};
pub use upload::Locator;
