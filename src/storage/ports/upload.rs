//! Upload provider port.

use crate::storage::domain::{BackendConfig, Locator};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Named strategy that packages and transfers a build directory.
///
/// Completes with either a locator or an error; never both, never neither.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Uploads `build_dir`.
    async fn upload(&self, build_dir: &Utf8Path, config: &BackendConfig)
    -> UploadResult<Locator>;
}

/// Errors returned by upload providers and the provider registry.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// No provider is registered under the name.
    #[error("unknown upload provider: {0}")]
    UnknownProvider(String),

    /// A provider is already registered under the name.
    #[error("upload provider already registered: {0}")]
    DuplicateProvider(String),

    /// The build directory does not exist.
    #[error("build directory {0} does not exist")]
    MissingBuildDirectory(Utf8PathBuf),

    /// The transfer failed.
    #[error("upload transfer failed: {0}")]
    Transfer(String),

    /// Generic runtime failure.
    #[error("upload runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl UploadError {
    /// Wraps a runtime error from an upload adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
