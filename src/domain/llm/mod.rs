//! LLM task payload model and the backend capability trait

mod adapter;
mod message;
mod request;
mod response;

pub use adapter::BackendAdapter;
pub use message::{Message, MessageRole};
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{FinishReason, LlmResponse, Usage};

#[cfg(test)]
pub use adapter::mock::ScriptedBackend;
