use serde::{Deserialize, Serialize};

use crate::domain::chain::BackendId;
use crate::domain::error::{DomainError, FailureKind};
use crate::domain::llm::LlmResponse;

/// The attempt that ended a dispatch successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSuccess {
    pub backend: BackendId,
    pub model: String,
    pub response: LlmResponse,
    /// How many earlier chain steps failed before this one succeeded.
    pub fallbacks_used: usize,
}

/// Final failure of one attempted chain step. If the step was retried, this
/// records the last error together with the total attempt count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailure {
    pub backend: BackendId,
    pub model: String,
    pub attempts: u32,
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    pub fn new(backend: BackendId, model: impl Into<String>, attempts: u32, error: &DomainError) -> Self {
        Self {
            backend,
            model: model.into(),
            attempts,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one full chain execution for one work item: the first
/// successful attempt, or the ordered failures of every attempted step.
/// The dispatcher always returns one of these for a resolvable chain; it
/// never throws per-step errors past its boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    chain: String,
    success: Option<AttemptSuccess>,
    failures: Vec<StepFailure>,
}

impl DispatchResult {
    pub fn succeeded(
        chain: impl Into<String>,
        success: AttemptSuccess,
        failures: Vec<StepFailure>,
    ) -> Self {
        Self {
            chain: chain.into(),
            success: Some(success),
            failures,
        }
    }

    pub fn exhausted(chain: impl Into<String>, failures: Vec<StepFailure>) -> Self {
        Self {
            chain: chain.into(),
            success: None,
            failures,
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn is_success(&self) -> bool {
        self.success.is_some()
    }

    pub fn success(&self) -> Option<&AttemptSuccess> {
        self.success.as_ref()
    }

    /// Ordered step failures, one per attempted step.
    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }

    /// Collapse into a plain response, turning exhaustion into an error.
    pub fn into_response(self) -> Result<LlmResponse, DomainError> {
        match self.success {
            Some(success) => Ok(success.response),
            None => Err(DomainError::chain_exhausted(self.chain)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::Message;

    fn success_for(backend: &str, model: &str) -> AttemptSuccess {
        AttemptSuccess {
            backend: BackendId::new(backend).unwrap(),
            model: model.to_string(),
            response: LlmResponse::new(
                "resp-1".to_string(),
                model.to_string(),
                Message::assistant("ok"),
            ),
            fallbacks_used: 1,
        }
    }

    #[test]
    fn test_successful_result() {
        let failure = StepFailure::new(
            BackendId::new("gemini").unwrap(),
            "gemini-2.5-flash-lite",
            3,
            &DomainError::unavailable("gemini", "503"),
        );

        let result = DispatchResult::succeeded(
            "fast",
            success_for("gemini", "gemini-2.5-flash"),
            vec![failure],
        );

        assert!(result.is_success());
        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].attempts, 3);
        assert_eq!(result.failures()[0].kind, FailureKind::Unavailable);
        assert_eq!(result.into_response().unwrap().content(), "ok");
    }

    #[test]
    fn test_exhausted_result() {
        let failures = vec![
            StepFailure::new(
                BackendId::new("gemini").unwrap(),
                "gemini-2.5-flash",
                1,
                &DomainError::unauthorized("gemini", "bad key"),
            ),
            StepFailure::new(
                BackendId::new("anthropic").unwrap(),
                "claude-sonnet-4-5",
                3,
                &DomainError::timeout("anthropic", 120_000),
            ),
        ];

        let result = DispatchResult::exhausted("standard", failures);

        assert!(!result.is_success());
        assert_eq!(result.failures().len(), 2);
        assert_eq!(result.failures()[0].kind, FailureKind::Unauthorized);

        let error = result.into_response().unwrap_err();
        assert!(matches!(error, DomainError::ChainExhausted { .. }));
    }

    #[test]
    fn test_result_serialization() {
        let result = DispatchResult::exhausted(
            "fast",
            vec![StepFailure::new(
                BackendId::new("gemini").unwrap(),
                "gemini-2.5-flash",
                1,
                &DomainError::rate_limited("gemini", "quota"),
            )],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["chain"], "fast");
        assert_eq!(json["failures"][0]["kind"], "rate_limited");
    }
}
