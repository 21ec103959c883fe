use crate::error::{Result, WardenError};
use crate::health::HealthState;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// A single bounded liveness check
///
/// Implementations classify every outcome as Healthy or Unhealthy and never
/// return an error past this boundary.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self) -> HealthState;
}

/// Probes an HTTP health endpoint owned by the supervised service
///
/// A 2xx response is Healthy; any other status, a timeout, or a transport
/// error is Unhealthy plus a logged diagnostic.
pub struct HttpProber {
    client: reqwest::Client,
    url: String,
}

impl HttpProber {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WardenError::Probe(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> HealthState {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Health check passed: HTTP {}", response.status());
                HealthState::Healthy
            }
            Ok(response) => {
                warn!("Health check failed: HTTP {}", response.status());
                HealthState::Unhealthy
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                HealthState::Unhealthy
            }
        }
    }
}
