//! Application services for storage backend supervision.

mod module;
mod supervisor;
mod upload;

pub use module::{
    DisabledNotice, ForwardToCommand, LogToggleCommand, ProbeServiceCheck, StartupOutcome,
    StorageModule, StorageModuleDeps, StorageModuleHandle,
};
pub use supervisor::{ProcessSupervisor, SupervisedBackend, SupervisorError, SupervisorResult};
pub use upload::{GatewayUploadProvider, UploadProviderRegistry};
