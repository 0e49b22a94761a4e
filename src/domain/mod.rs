//! Core domain: chains, dispatch, batching and the error taxonomy

pub mod batch;
pub mod chain;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod llm;

pub use error::{DomainError, FailureKind};
