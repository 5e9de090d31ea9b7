//! Availability probe port.

use crate::storage::domain::GatewayUrl;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for availability probes.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Side-effect-free reachability check against a storage gateway.
///
/// Implementations must be safe to call at any frequency; two calls in
/// immediate succession with no backend change return the same answer.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Reports whether the gateway answers.
    async fn is_available(&self, gateway: &GatewayUrl) -> ProbeResult<bool>;
}

/// Errors returned by availability probes.
///
/// Callers treat every probe error as "unavailable".
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The transport failed before an answer arrived.
    #[error("gateway {gateway} unreachable: {reason}")]
    Transport {
        /// Probed gateway.
        gateway: GatewayUrl,
        /// Transport failure description.
        reason: String,
    },

    /// No answer arrived in time.
    #[error("gateway {gateway} did not answer within {timeout:?}")]
    Timeout {
        /// Probed gateway.
        gateway: GatewayUrl,
        /// Elapsed bound.
        timeout: Duration,
    },

    /// Generic runtime failure.
    #[error("probe runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProbeError {
    /// Wraps a runtime error from the probe adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
