//! Storage network client port.

use super::UploadResult;
use crate::storage::domain::GatewayUrl;
use async_trait::async_trait;
use camino::Utf8Path;

/// Opaque client for the storage network behind a gateway.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Uploads the contents of `directory` and returns the content hash.
    async fn upload_directory(
        &self,
        gateway: &GatewayUrl,
        directory: &Utf8Path,
    ) -> UploadResult<String>;
}
