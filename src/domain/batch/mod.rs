//! Batch orchestration over the dispatcher

mod item;
mod orchestrator;
mod report;

pub use item::BatchItem;
pub use orchestrator::{BatchConfig, BatchOrchestrator, DEFAULT_MAX_CONCURRENCY};
pub use report::{BatchReport, BatchStatus, ItemOutcome, ItemReport};
