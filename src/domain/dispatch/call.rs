use std::time::Duration;

use crate::domain::chain::BackendId;
use crate::domain::llm::LlmRequest;

/// Immutable description of one attempt against a backend. Built by the
/// dispatcher when entering a chain step, consumed by the adapter.
#[derive(Debug, Clone)]
pub struct BackendCall {
    backend: BackendId,
    model: String,
    request: LlmRequest,
    timeout: Duration,
}

impl BackendCall {
    pub fn new(
        backend: BackendId,
        model: impl Into<String>,
        request: LlmRequest,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            request,
            timeout,
        }
    }

    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn request(&self) -> &LlmRequest {
        &self.request
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_accessors() {
        let call = BackendCall::new(
            BackendId::new("gemini").unwrap(),
            "gemini-2.5-flash",
            LlmRequest::builder().user("Hello").build(),
            Duration::from_secs(120),
        );

        assert_eq!(call.backend().as_str(), "gemini");
        assert_eq!(call.model(), "gemini-2.5-flash");
        assert_eq!(call.request().messages.len(), 1);
        assert_eq!(call.timeout_ms(), 120_000);
    }
}
