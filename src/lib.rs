//! LLM Relay
//!
//! Fallback-chain dispatch and batch orchestration for LLM backends:
//! - Named fallback chains of backend/model steps, tried in priority order
//! - Per-step retries with jittered exponential backoff
//! - Batch runs over a bounded worker pool, with per-item isolation
//! - Health probing of every configured backend

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::batch::{BatchConfig, BatchItem, BatchOrchestrator, BatchReport, BatchStatus};
pub use domain::dispatch::{DispatchResult, FallbackDispatcher};
pub use domain::health::{HealthMonitor, HealthSnapshot};
pub use domain::llm::{LlmRequest, LlmResponse};
pub use domain::{DomainError, FailureKind};

use std::sync::Arc;
use std::time::Duration;

use domain::chain::{ChainRegistry, RetryPolicy};
use domain::dispatch::DispatcherConfig;
use infrastructure::llm::{build_adapters, default_probes};
use infrastructure::logging::init_logging;
use tracing::info;

/// The fully wired relay: one dispatcher, one batch orchestrator and one
/// health monitor sharing the same chain and adapter registries.
#[derive(Debug)]
pub struct LlmRelay {
    dispatcher: Arc<FallbackDispatcher>,
    orchestrator: BatchOrchestrator,
    health: HealthMonitor,
}

impl LlmRelay {
    /// Wire a relay from configuration, using the built-in chains.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let adapters = Arc::new(build_adapters(&config.backends)?);
        let chains = Arc::new(ChainRegistry::builtin());

        let retry = RetryPolicy::new(config.dispatch.max_retries)
            .with_base_delay(config.dispatch.retry_base_delay_ms)
            .with_max_delay(config.dispatch.retry_max_delay_ms);

        let dispatcher_config = DispatcherConfig {
            retry,
            call_timeout: Duration::from_secs(config.dispatch.call_timeout_secs),
        };

        let dispatcher = Arc::new(FallbackDispatcher::new(
            chains,
            Arc::clone(&adapters),
            dispatcher_config,
        ));

        let mut batch_config =
            BatchConfig::default().with_max_concurrency(config.batch.max_concurrency);

        if let Some(secs) = config.batch.deadline_secs {
            batch_config = batch_config.with_deadline(Duration::from_secs(secs));
        }

        let orchestrator = BatchOrchestrator::new(Arc::clone(&dispatcher), batch_config);
        let health = HealthMonitor::new(adapters, default_probes(&config.backends));

        info!(
            chains = ?dispatcher.chains().chain_names(),
            max_concurrency = config.batch.max_concurrency,
            "relay wired"
        );

        Ok(Self {
            dispatcher,
            orchestrator,
            health,
        })
    }

    /// Load `.env` and the application configuration, initialize logging and
    /// wire the relay. The usual entrypoint for binaries embedding this crate.
    pub fn init() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = AppConfig::load()?;
        init_logging(&config.logging);

        Self::from_config(&config)
    }

    pub fn dispatcher(&self) -> &FallbackDispatcher {
        &self.dispatcher
    }

    pub fn batch(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }
}
