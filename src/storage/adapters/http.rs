//! HTTP availability probe for storage gateways.

use crate::storage::{
    domain::GatewayUrl,
    ports::{AvailabilityProbe, ProbeError, ProbeResult},
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// Default bound on a single probe request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Probes a gateway with a plain `GET`.
///
/// Any HTTP answer below 500 means the node is up: a gateway that rejects
/// the path is still serving.
#[derive(Debug, Clone)]
pub struct HttpGatewayProbe {
    http: reqwest::Client,
    path: String,
    timeout: Duration,
}

impl HttpGatewayProbe {
    /// Creates a probe that requests the gateway root.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Runtime`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> ProbeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProbeError::runtime)?;
        Ok(Self {
            http,
            path: String::new(),
            timeout,
        })
    }

    /// Creates a probe with the default three-second request bound.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Runtime`] when the HTTP client cannot be built.
    pub fn with_default_timeout() -> ProbeResult<Self> {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Requests `path` below the gateway instead of its root.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

#[async_trait]
impl AvailabilityProbe for HttpGatewayProbe {
    async fn is_available(&self, gateway: &GatewayUrl) -> ProbeResult<bool> {
        let url = gateway.join(&self.path);
        trace!(%url, "probing storage gateway");
        match self.http.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                trace!(%url, %status, "storage gateway answered");
                Ok(!status.is_server_error())
            }
            Err(err) if err.is_timeout() => Err(ProbeError::Timeout {
                gateway: gateway.clone(),
                timeout: self.timeout,
            }),
            Err(err) => Err(ProbeError::Transport {
                gateway: gateway.clone(),
                reason: err.to_string(),
            }),
        }
    }
}
