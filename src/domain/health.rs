//! Backend health probing: one cheap request per backend, classified
//! through the same error taxonomy as real traffic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::chain::ChainStep;
use crate::domain::dispatch::{AdapterRegistry, BackendCall, DispatchResult, FallbackDispatcher};
use crate::domain::error::{DomainError, FailureKind};
use crate::domain::llm::LlmRequest;

/// Default cap on a single health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of probing one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    pub backend: String,
    pub model: String,
    pub healthy: bool,
    pub checked_at: DateTime<Utc>,
    /// Failure classification when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Point-in-time view across all probed backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub backends: Vec<BackendHealth>,
}

impl HealthSnapshot {
    pub fn backend(&self, name: &str) -> Option<&BackendHealth> {
        self.backends.iter().find(|b| b.backend == name)
    }
}

/// Probes each configured backend with a minimal request against its
/// designated probe model. Probe targets are fixed at construction; pick
/// the cheapest model each backend serves.
#[derive(Debug)]
pub struct HealthMonitor {
    adapters: Arc<AdapterRegistry>,
    probes: Vec<ChainStep>,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(adapters: Arc<AdapterRegistry>, probes: Vec<ChainStep>) -> Self {
        Self {
            adapters,
            probes,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Probe every target once. The snapshot is healthy only when all
    /// backends answered.
    pub async fn check_all(&self) -> HealthSnapshot {
        let mut backends = Vec::with_capacity(self.probes.len());

        for probe in &self.probes {
            backends.push(self.check(probe).await);
        }

        let healthy = backends.iter().all(|b| b.healthy);
        HealthSnapshot { healthy, backends }
    }

    /// Send one probe through the full fallback dispatch path for the named
    /// chain. Where `check_all` answers "is each backend reachable", this
    /// answers "would a dispatch on this chain succeed right now",
    /// exercising chain resolution, retries and fallback order exactly as
    /// real traffic does.
    pub async fn check_chain(
        dispatcher: &FallbackDispatcher,
        chain_name: &str,
    ) -> Result<DispatchResult, DomainError> {
        dispatcher.dispatch(chain_name, probe_request()).await
    }

    async fn check(&self, probe: &ChainStep) -> BackendHealth {
        let checked_at = Utc::now();
        let backend = probe.backend().as_str().to_string();
        let model = probe.model().to_string();

        let adapter = match self.adapters.get(probe.backend()) {
            Ok(adapter) => adapter,
            Err(error) => {
                return BackendHealth {
                    backend,
                    model,
                    healthy: false,
                    checked_at,
                    failure: Some(error.kind()),
                    detail: Some(error.to_string()),
                };
            }
        };

        let call = BackendCall::new(
            probe.backend().clone(),
            probe.model(),
            probe_request(),
            self.probe_timeout,
        );

        match adapter.invoke(&call).await {
            Ok(_) => {
                info!(backend = backend.as_str(), model = model.as_str(), "backend healthy");

                BackendHealth {
                    backend,
                    model,
                    healthy: true,
                    checked_at,
                    failure: None,
                    detail: None,
                }
            }
            Err(error) => {
                warn!(
                    backend = backend.as_str(),
                    model = model.as_str(),
                    error = %error,
                    "backend unhealthy"
                );

                BackendHealth {
                    backend,
                    model,
                    healthy: false,
                    checked_at,
                    failure: Some(error.kind()),
                    detail: Some(error.to_string()),
                }
            }
        }
    }
}

/// The minimal request every probe sends.
fn probe_request() -> LlmRequest {
    LlmRequest::builder().user("ping").max_tokens(8).build()
}
