use std::fmt::Debug;

use async_trait::async_trait;

use super::LlmResponse;
use crate::domain::dispatch::BackendCall;
use crate::domain::DomainError;

/// Capability contract every backend exposes to the dispatcher: one call in,
/// one classified outcome out. Provider-specific request/response shaping is
/// fully internal to each implementation.
#[async_trait]
pub trait BackendAdapter: Send + Sync + Debug {
    /// Perform one attempt against the provider, bounded by `call.timeout()`.
    ///
    /// Failures must be classified through the [`DomainError`] taxonomy so
    /// the dispatcher can decide between retrying the step and advancing to
    /// the next one.
    async fn invoke(&self, call: &BackendCall) -> Result<LlmResponse, DomainError>;

    /// Stable name of the backend, matching chain step backend ids.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::llm::Message;

    /// Test backend that replays a scripted sequence of outcomes, one per
    /// invocation, and counts how often it was called.
    #[derive(Debug)]
    pub struct ScriptedBackend {
        name: &'static str,
        script: Mutex<VecDeque<Result<LlmResponse, DomainError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                script: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn then_ok(self, content: &str) -> Self {
            let response = LlmResponse::new(
                format!("{}-response", self.name),
                "scripted-model".to_string(),
                Message::assistant(content),
            );
            self.script.lock().unwrap().push_back(Ok(response));
            self
        }

        pub fn then_err(self, error: DomainError) -> Self {
            self.script.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl BackendAdapter for ScriptedBackend {
        async fn invoke(&self, _call: &BackendCall) -> Result<LlmResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::Relaxed);

            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DomainError::internal("scripted backend exhausted")))
        }

        fn backend_name(&self) -> &'static str {
            self.name
        }
    }
}
