//! Named upload strategies and the gateway-backed provider.

use crate::storage::{
    domain::{BackendConfig, GatewayUrl, Locator},
    ports::{StorageClient, UploadError, UploadProvider, UploadResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Registry of upload providers keyed by name.
#[derive(Default)]
pub struct UploadProviderRegistry {
    providers: RwLock<BTreeMap<String, Arc<dyn UploadProvider>>>,
}

impl UploadProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::DuplicateProvider`] when `name` is taken; the
    /// existing provider stays registered.
    pub fn register_upload_command(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn UploadProvider>,
    ) -> UploadResult<()> {
        let key = name.into();
        let mut providers = self
            .providers
            .write()
            .map_err(|err| UploadError::runtime(std::io::Error::other(err.to_string())))?;
        if providers.contains_key(&key) {
            return Err(UploadError::DuplicateProvider(key));
        }
        debug!(provider = %key, "registered upload provider");
        providers.insert(key, provider);
        Ok(())
    }

    /// Removes the provider registered as `name`.
    ///
    /// Returns whether a provider was removed.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Runtime`] when the registry lock is poisoned.
    pub fn unregister(&self, name: &str) -> UploadResult<bool> {
        let mut providers = self
            .providers
            .write()
            .map_err(|err| UploadError::runtime(std::io::Error::other(err.to_string())))?;
        let removed = providers.remove(name).is_some();
        if removed {
            debug!(provider = name, "unregistered upload provider");
        }
        Ok(removed)
    }

    /// Uploads `build_dir` through the provider registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::UnknownProvider`] for unregistered names, or the
    /// provider's own error.
    pub async fn invoke_upload(
        &self,
        name: &str,
        build_dir: &Utf8Path,
        config: &BackendConfig,
    ) -> UploadResult<Locator> {
        let provider = self
            .providers
            .read()
            .map_err(|err| UploadError::runtime(std::io::Error::other(err.to_string())))?
            .get(name)
            .cloned()
            .ok_or_else(|| UploadError::UnknownProvider(name.to_owned()))?;
        provider.upload(build_dir, config).await
    }

    /// Uploads through the provider named by `config.upload_provider()`.
    ///
    /// # Errors
    ///
    /// See [`UploadProviderRegistry::invoke_upload`].
    pub async fn invoke_configured(
        &self,
        build_dir: &Utf8Path,
        config: &BackendConfig,
    ) -> UploadResult<Locator> {
        self.invoke_upload(config.upload_provider(), build_dir, config)
            .await
    }

    /// Returns registered provider names in order.
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        self.providers
            .read()
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for UploadProviderRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

/// Uploads a build directory through a storage gateway.
pub struct GatewayUploadProvider<S>
where
    S: StorageClient + ?Sized,
{
    gateway: GatewayUrl,
    client: Arc<S>,
}

impl<S> GatewayUploadProvider<S>
where
    S: StorageClient + ?Sized,
{
    /// Creates a provider uploading to `gateway`.
    #[must_use]
    pub const fn new(gateway: GatewayUrl, client: Arc<S>) -> Self {
        Self { gateway, client }
    }
}

#[async_trait]
impl<S> UploadProvider for GatewayUploadProvider<S>
where
    S: StorageClient + ?Sized + 'static,
{
    async fn upload(&self, build_dir: &Utf8Path, config: &BackendConfig) -> UploadResult<Locator> {
        let is_dir = tokio::fs::metadata(build_dir)
            .await
            .is_ok_and(|metadata| metadata.is_dir());
        if !is_dir {
            return Err(UploadError::MissingBuildDirectory(build_dir.to_owned()));
        }

        info!(gateway = %self.gateway, directory = %build_dir, "uploading build directory");
        let hash = self.client.upload_directory(&self.gateway, build_dir).await?;
        let url = format!("{}{hash}", self.gateway.get_url(config));
        info!(%hash, %url, "upload complete");
        Ok(Locator::new(hash, url))
    }
}
