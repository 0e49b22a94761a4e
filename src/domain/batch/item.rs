use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::llm::LlmRequest;

/// One unit of batch work: a caller-visible id plus the request payload.
/// The id is echoed back in the report so callers can correlate outcomes
/// without relying on ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    id: String,
    request: LlmRequest,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, request: LlmRequest) -> Self {
        Self {
            id: id.into(),
            request,
        }
    }

    /// Item with a generated id, for callers that do not track their own.
    pub fn with_generated_id(request: LlmRequest) -> Self {
        Self::new(Uuid::new_v4().to_string(), request)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request(&self) -> &LlmRequest {
        &self.request
    }

    pub fn into_parts(self) -> (String, LlmRequest) {
        (self.id, self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let request = LlmRequest::builder().user("hi").build();
        let a = BatchItem::with_generated_id(request.clone());
        let b = BatchItem::with_generated_id(request);

        assert_ne!(a.id(), b.id());
        assert!(!a.id().is_empty());
    }
}
