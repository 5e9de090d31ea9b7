//! Port contracts for storage backend supervision.

mod client;
mod launcher;
mod probe;
mod upload;

pub use client::StorageClient;
pub use launcher::{LaunchError, LaunchRequest, LaunchResult, LaunchedProcess, ProcessLauncher};
pub use probe::{AvailabilityProbe, ProbeError, ProbeResult};
pub use upload::{UploadError, UploadProvider, UploadResult};
