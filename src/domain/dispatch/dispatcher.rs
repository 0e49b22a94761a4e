//! Fallback dispatcher: walks a chain's steps in priority order, retrying
//! transient failures in place and advancing past everything else.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::{AdapterRegistry, AttemptSuccess, BackendCall, DispatchResult, StepFailure};
use crate::domain::chain::{ChainRegistry, ChainStep, RetryPolicy};
use crate::domain::llm::LlmRequest;
use crate::domain::DomainError;

/// Default per-attempt timeout, matching the longest tolerable provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Tuning knobs for a dispatcher instance.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub retry: RetryPolicy,
    pub call_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Executes one request against a named fallback chain.
///
/// The contract at this boundary: a resolvable chain always yields an
/// `Ok(DispatchResult)`, success or exhausted. `Err` is reserved for the
/// caller's own mistakes (unknown chain, invalid payload) and cancellation.
#[derive(Debug)]
pub struct FallbackDispatcher {
    chains: Arc<ChainRegistry>,
    adapters: Arc<AdapterRegistry>,
    config: DispatcherConfig,
}

impl FallbackDispatcher {
    pub fn new(
        chains: Arc<ChainRegistry>,
        adapters: Arc<AdapterRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            chains,
            adapters,
            config,
        }
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// Dispatch without external cancellation.
    pub async fn dispatch(
        &self,
        chain_name: &str,
        request: LlmRequest,
    ) -> Result<DispatchResult, DomainError> {
        self.dispatch_with_cancel(chain_name, request, &CancellationToken::new())
            .await
    }

    /// Walk the chain until one step succeeds or all are exhausted.
    ///
    /// Retryable failures (rate limit, unavailable, timeout) retry the same
    /// step with jittered exponential backoff; anything else records the
    /// failure and advances immediately. The first success short-circuits:
    /// later steps are never contacted.
    #[instrument(skip(self, request, cancel), fields(chain = chain_name))]
    pub async fn dispatch_with_cancel(
        &self,
        chain_name: &str,
        request: LlmRequest,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, DomainError> {
        request.validate()?;
        let chain = self.chains.resolve(chain_name)?;

        let mut failures: Vec<StepFailure> = Vec::new();

        for (step_index, step) in chain.steps().iter().enumerate() {
            if step_index > 0 {
                info!(
                    backend = %step.backend(),
                    model = step.model(),
                    "falling back to next chain step"
                );
            }

            match self.execute_step(step, &request, cancel).await? {
                StepOutcome::Success(success) => {
                    let success = AttemptSuccess {
                        fallbacks_used: step_index,
                        ..success
                    };

                    info!(
                        backend = %success.backend,
                        model = success.model,
                        fallbacks_used = success.fallbacks_used,
                        "dispatch succeeded"
                    );

                    return Ok(DispatchResult::succeeded(chain_name, success, failures));
                }
                StepOutcome::Failed(failure) => {
                    warn!(
                        backend = %failure.backend,
                        model = failure.model,
                        attempts = failure.attempts,
                        kind = %failure.kind,
                        "chain step exhausted"
                    );

                    failures.push(failure);
                }
            }
        }

        warn!(steps = failures.len(), "all chain steps exhausted");
        Ok(DispatchResult::exhausted(chain_name, failures))
    }

    /// Run one chain step to its final outcome, including in-place retries.
    async fn execute_step(
        &self,
        step: &ChainStep,
        request: &LlmRequest,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, DomainError> {
        let adapter = match self.adapters.get(step.backend()) {
            Ok(adapter) => adapter,
            // A chain step naming an unconfigured backend is recorded and
            // skipped so the rest of the chain still gets its turn.
            Err(error) => {
                return Ok(StepOutcome::Failed(StepFailure::new(
                    step.backend().clone(),
                    step.model(),
                    0,
                    &error,
                )));
            }
        };

        let call = BackendCall::new(
            step.backend().clone(),
            step.model(),
            request.clone(),
            self.config.call_timeout,
        );

        let max_attempts = self.config.retry.max_retries + 1;

        for attempt in 0..max_attempts {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DomainError::Cancelled),
                result = adapter.invoke(&call) => result,
            };

            match result {
                Ok(response) => {
                    return Ok(StepOutcome::Success(AttemptSuccess {
                        backend: step.backend().clone(),
                        model: step.model().to_string(),
                        response,
                        fallbacks_used: 0,
                    }));
                }
                Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.config.retry.jittered_delay_for_attempt(attempt);

                    warn!(
                        backend = %step.backend(),
                        model = step.model(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying chain step after transient failure"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(DomainError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => {
                    return Ok(StepOutcome::Failed(StepFailure::new(
                        step.backend().clone(),
                        step.model(),
                        attempt + 1,
                        &error,
                    )));
                }
            }
        }

        // The retry loop always returns before running out of attempts.
        Err(DomainError::internal("retry loop exited without outcome"))
    }
}

enum StepOutcome {
    Success(AttemptSuccess),
    Failed(StepFailure),
}
