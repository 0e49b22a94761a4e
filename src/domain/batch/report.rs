use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::dispatch::DispatchResult;
use crate::domain::error::{DomainError, FailureKind};

/// How far a batch got as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item produced a successful response.
    Completed,
    /// Some items succeeded, some did not.
    Partial,
    /// No item produced a successful response.
    Failed,
}

/// Terminal outcome of one batch item.
///
/// `Dispatched` means the item went through its chain and carries the full
/// per-step record, success or exhausted. `Rejected` means the item never
/// completed a chain walk at all: invalid payload, batch deadline, or a
/// worker fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Dispatched(DispatchResult),
    Rejected { kind: FailureKind, message: String },
}

impl ItemOutcome {
    pub fn rejected(error: &DomainError) -> Self {
        Self::Rejected {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Dispatched(result) if result.is_success())
    }
}

/// One item's line in the batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn new(id: impl Into<String>, outcome: ItemOutcome) -> Self {
        Self {
            id: id.into(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Full account of a batch run. Every submitted item appears exactly once,
/// in submission order, whatever happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    id: String,
    chain: String,
    status: BatchStatus,
    total: usize,
    succeeded: usize,
    failed: usize,
    completed_at: DateTime<Utc>,
    items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn new(chain: impl Into<String>, items: Vec<ItemReport>) -> Self {
        let total = items.len();
        let succeeded = items.iter().filter(|item| item.is_success()).count();
        let failed = total - succeeded;

        let status = if failed == 0 {
            BatchStatus::Completed
        } else if succeeded == 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        };

        Self {
            id: Uuid::new_v4().to_string(),
            chain: chain.into(),
            status,
            total,
            succeeded,
            failed,
            completed_at: Utc::now(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn items(&self) -> &[ItemReport] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&ItemReport> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::BackendId;
    use crate::domain::dispatch::{AttemptSuccess, StepFailure};
    use crate::domain::llm::{LlmResponse, Message};

    fn dispatched_ok(id: &str) -> ItemReport {
        let success = AttemptSuccess {
            backend: BackendId::new("gemini").unwrap(),
            model: "gemini-2.5-flash".to_string(),
            response: LlmResponse::new(
                format!("resp-{}", id),
                "gemini-2.5-flash".to_string(),
                Message::assistant("ok"),
            ),
            fallbacks_used: 0,
        };

        ItemReport::new(id, ItemOutcome::Dispatched(DispatchResult::succeeded("fast", success, vec![])))
    }

    fn dispatched_exhausted(id: &str) -> ItemReport {
        let failure = StepFailure::new(
            BackendId::new("gemini").unwrap(),
            "gemini-2.5-flash",
            1,
            &DomainError::unauthorized("gemini", "bad key"),
        );

        ItemReport::new(
            id,
            ItemOutcome::Dispatched(DispatchResult::exhausted("fast", vec![failure])),
        )
    }

    #[test]
    fn test_all_success_is_completed() {
        let report = BatchReport::new("fast", vec![dispatched_ok("a"), dispatched_ok("b")]);

        assert_eq!(report.status(), BatchStatus::Completed);
        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_mixed_outcomes_are_partial() {
        let rejected = ItemReport::new(
            "b",
            ItemOutcome::rejected(&DomainError::validation("empty payload")),
        );
        let report = BatchReport::new("fast", vec![dispatched_ok("a"), rejected]);

        assert_eq!(report.status(), BatchStatus::Partial);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_no_success_is_failed() {
        let report = BatchReport::new("fast", vec![dispatched_exhausted("a")]);

        assert_eq!(report.status(), BatchStatus::Failed);
        assert_eq!(report.succeeded(), 0);
    }

    #[test]
    fn test_empty_batch_is_completed() {
        let report = BatchReport::new("fast", vec![]);

        assert_eq!(report.status(), BatchStatus::Completed);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_lookup_by_id() {
        let report = BatchReport::new("fast", vec![dispatched_ok("a"), dispatched_exhausted("b")]);

        assert!(report.item("a").unwrap().is_success());
        assert!(!report.item("b").unwrap().is_success());
        assert!(report.item("c").is_none());
    }

    #[test]
    fn test_report_serialization() {
        let rejected = ItemReport::new(
            "late",
            ItemOutcome::Rejected {
                kind: FailureKind::BatchTimeout,
                message: "Batch deadline elapsed before item started".to_string(),
            },
        );
        let report = BatchReport::new("fast", vec![rejected]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["items"][0]["outcome"], "rejected");
        assert_eq!(json["items"][0]["kind"], "batch_timeout");
    }
}
