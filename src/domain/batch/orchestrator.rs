//! Batch orchestration: a bounded worker pool over the fallback dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::{BatchItem, BatchReport, ItemOutcome, ItemReport};
use crate::domain::dispatch::FallbackDispatcher;
use crate::domain::DomainError;

/// Default number of items dispatched concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Upper bound on items in flight at once.
    pub max_concurrency: usize,
    /// Optional wall-clock budget for the whole batch. Items that have not
    /// started when it elapses are rejected; items already in flight finish.
    pub deadline: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline: None,
        }
    }
}

impl BatchConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Runs batches of items through a fallback chain with bounded concurrency.
///
/// Items are isolated: one item exhausting its chain, failing validation or
/// panicking never disturbs the others, and every submitted item appears
/// exactly once in the report, in submission order.
#[derive(Debug)]
pub struct BatchOrchestrator {
    dispatcher: Arc<FallbackDispatcher>,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(dispatcher: Arc<FallbackDispatcher>, config: BatchConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Run every item through the named chain and collect one report.
    pub async fn run(
        &self,
        chain_name: &str,
        items: Vec<BatchItem>,
    ) -> Result<BatchReport, DomainError> {
        self.run_with_cancel(chain_name, items, &CancellationToken::new())
            .await
    }

    /// Run a batch that honors a caller-abort token: cancelling it
    /// interrupts in-flight dispatches at their next suspension point and
    /// rejects the remaining items as cancelled.
    ///
    /// An unknown chain fails the whole batch up front, before any item is
    /// dispatched. Everything after that point is reported per item rather
    /// than raised.
    #[instrument(skip(self, items, cancel), fields(chain = chain_name, items = items.len()))]
    pub async fn run_with_cancel(
        &self,
        chain_name: &str,
        items: Vec<BatchItem>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, DomainError> {
        self.dispatcher.chains().resolve(chain_name)?;

        if items.is_empty() {
            return Err(DomainError::validation("batch contains no items"));
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let deadline = self.config.deadline.map(|budget| Instant::now() + budget);

        info!(
            max_concurrency = self.config.max_concurrency,
            deadline_ms = self.config.deadline.map(|d| d.as_millis() as u64),
            "starting batch"
        );

        // Handles are joined in submission order so the report preserves it
        // and a panicked worker can still be attributed to its item.
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let (id, request) = item.into_parts();
            let dispatcher = Arc::clone(&self.dispatcher);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let chain = chain_name.to_string();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ItemOutcome::rejected(&DomainError::internal(
                            "worker pool closed unexpectedly",
                        ));
                    }
                };

                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        return ItemOutcome::rejected(&DomainError::BatchTimeout);
                    }
                }

                match dispatcher.dispatch_with_cancel(&chain, request, &cancel).await {
                    Ok(result) => ItemOutcome::Dispatched(result),
                    Err(error) => ItemOutcome::rejected(&error),
                }
            });

            handles.push((id, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());

        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(item = id, error = %join_error, "batch worker failed");
                    ItemOutcome::rejected(&DomainError::internal(format!(
                        "worker failed: {}",
                        join_error
                    )))
                }
            };

            reports.push(ItemReport::new(id, outcome));
        }

        let report = BatchReport::new(chain_name, reports);

        info!(
            status = ?report.status(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );

        Ok(report)
    }
}
