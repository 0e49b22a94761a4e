use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::classify_http_error;
use super::http_client::HttpClientTrait;
use crate::domain::dispatch::BackendCall;
use crate::domain::llm::{
    BackendAdapter, FinishReason, LlmResponse, Message, MessageRole, Usage,
};
use crate::domain::DomainError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini generateContent API adapter
#[derive(Debug)]
pub struct GeminiAdapter<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiAdapter<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            api_key: api_key.into(),
            base_url,
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(&self, call: &BackendCall) -> serde_json::Value {
        let request = call.request();

        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for message in &request.messages {
            match message.role {
                MessageRole::System => {
                    system_parts.push(serde_json::json!({"text": message.content()}));
                }
                MessageRole::User => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{"text": message.content()}],
                    }));
                }
                MessageRole::Assistant => {
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": [{"text": message.content()}],
                    }));
                }
            }
        }

        let mut body = serde_json::json!({ "contents": contents });

        if !system_parts.is_empty() {
            body["systemInstruction"] = serde_json::json!({ "parts": system_parts });
        }

        let mut generation_config = serde_json::Map::new();

        if let Some(temp) = request.temperature {
            generation_config.insert("temperature".to_string(), serde_json::json!(temp));
        }

        if let Some(max_tokens) = request.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }

        if let Some(top_p) = request.top_p {
            generation_config.insert("topP".to_string(), serde_json::json!(top_p));
        }

        if let Some(ref stop) = request.stop {
            generation_config.insert("stopSequences".to_string(), serde_json::json!(stop));
        }

        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(
        &self,
        model: &str,
        json: serde_json::Value,
    ) -> Result<LlmResponse, DomainError> {
        let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::invalid_response("gemini", format!("failed to parse response: {}", e))
        })?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::invalid_response("gemini", "response has no candidates"))?;

        let content = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.is_empty() {
            return Err(DomainError::invalid_response(
                "gemini",
                "candidate carries no text",
            ));
        }

        let id = response
            .response_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut llm_response = LlmResponse::new(id, model.to_string(), Message::assistant(content))
            .with_finish_reason(parse_finish_reason(candidate.finish_reason.as_deref()));

        if let Some(usage) = response.usage_metadata {
            llm_response = llm_response.with_usage(Usage::new(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> BackendAdapter for GeminiAdapter<C> {
    async fn invoke(&self, call: &BackendCall) -> Result<LlmResponse, DomainError> {
        let url = self.generate_url(call.model());
        let body = self.build_request(call);

        let response = self
            .client
            .post_json(&url, self.headers(), &body, call.timeout())
            .await
            .map_err(|e| classify_http_error("gemini", call.timeout_ms(), e))?;

        self.parse_response(call.model(), response)
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Stop,
    }
}

// Gemini API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::chain::BackendId;
    use crate::domain::llm::LlmRequest;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use crate::infrastructure::llm::HttpError;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

    fn call(request: LlmRequest) -> BackendCall {
        BackendCall::new(
            BackendId::new("gemini").unwrap(),
            "gemini-2.5-flash",
            request,
            Duration::from_secs(120),
        )
    }

    #[tokio::test]
    async fn test_invoke_parses_response() {
        let mock_response = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello from Gemini"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 8,
                "candidatesTokenCount": 4,
                "totalTokenCount": 12
            },
            "responseId": "resp-42"
        });

        let client = MockHttpClient::new().with_response(TEST_URL, mock_response);
        let adapter = GeminiAdapter::new(client, "test-key");

        let request = LlmRequest::builder().user("Hello").build();
        let response = adapter.invoke(&call(request)).await.unwrap();

        assert_eq!(response.id, "resp-42");
        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.content(), "Hello from Gemini");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 12);
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_candidates() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"candidates": []}));
        let adapter = GeminiAdapter::new(client, "test-key");

        let request = LlmRequest::builder().user("Hello").build();
        let error = adapter.invoke(&call(request)).await.unwrap_err();

        assert!(matches!(error, DomainError::InvalidResponse { .. }));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn test_invoke_classifies_server_error() {
        let client = MockHttpClient::new().with_error(
            TEST_URL,
            HttpError::Status {
                status: 503,
                body: "model overloaded".to_string(),
            },
        );
        let adapter = GeminiAdapter::new(client, "test-key");

        let request = LlmRequest::builder().user("Hello").build();
        let error = adapter.invoke(&call(request)).await.unwrap_err();

        assert!(matches!(error, DomainError::Unavailable { .. }));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_request_shape() {
        let adapter = GeminiAdapter::new(MockHttpClient::new(), "test-key");

        let request = LlmRequest::builder()
            .system("Be terse")
            .user("Hi")
            .assistant("Hello")
            .user("Bye")
            .temperature(0.3)
            .max_tokens(256)
            .build();

        let body = adapter.build_request(&call(request));

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be terse");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_generate_url_embeds_model() {
        let adapter =
            GeminiAdapter::with_base_url(MockHttpClient::new(), "k", "http://localhost:9000/");

        assert_eq!(
            adapter.generate_url("gemini-2.5-pro"),
            "http://localhost:9000/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
