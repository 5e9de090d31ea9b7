//! In-memory storage network client.

use crate::storage::{
    domain::GatewayUrl,
    ports::{StorageClient, UploadError, UploadResult},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Client that records uploads and answers with random content hashes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorageClient {
    state: Arc<RwLock<InMemoryClientState>>,
}

#[derive(Debug, Default)]
struct InMemoryClientState {
    uploads: Vec<(GatewayUrl, Utf8PathBuf, String)>,
    failure: Option<String>,
}

impl InMemoryStorageClient {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later upload fail with a transfer error.
    ///
    /// # Errors
    ///
    /// Returns upload runtime errors when lock acquisition fails.
    pub fn fail_with(&self, reason: impl Into<String>) -> UploadResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| UploadError::runtime(std::io::Error::other(err.to_string())))?;
        state.failure = Some(reason.into());
        Ok(())
    }

    /// Returns `(gateway, directory, hash)` for every successful upload.
    #[must_use]
    pub fn uploads(&self) -> Vec<(GatewayUrl, Utf8PathBuf, String)> {
        self.state
            .read()
            .map(|state| state.uploads.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn upload_directory(
        &self,
        gateway: &GatewayUrl,
        directory: &Utf8Path,
    ) -> UploadResult<String> {
        let mut state = self
            .state
            .write()
            .map_err(|err| UploadError::runtime(std::io::Error::other(err.to_string())))?;
        if let Some(reason) = &state.failure {
            return Err(UploadError::Transfer(reason.clone()));
        }
        let hash = Uuid::new_v4().simple().to_string();
        state
            .uploads
            .push((gateway.clone(), directory.to_owned(), hash.clone()));
        Ok(hash)
    }
}
