//! Fallback chain domain - chain definitions and the startup registry

mod entity;
mod registry;

pub use entity::{BackendId, ChainId, ChainStep, FallbackChain, RetryPolicy};
pub use registry::ChainRegistry;
