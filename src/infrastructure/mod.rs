//! Infrastructure: provider adapters and logging

pub mod llm;
pub mod logging;
