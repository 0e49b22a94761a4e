//! Single-request dispatch: chain walking, retries and fallback

mod adapters;
mod call;
mod dispatcher;
mod result;

pub use adapters::AdapterRegistry;
pub use call::BackendCall;
pub use dispatcher::{DispatcherConfig, FallbackDispatcher, DEFAULT_CALL_TIMEOUT};
pub use result::{AttemptSuccess, DispatchResult, StepFailure};
