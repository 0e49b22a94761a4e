use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::classify_http_error;
use super::http_client::HttpClientTrait;
use crate::domain::dispatch::BackendCall;
use crate::domain::llm::{
    BackendAdapter, FinishReason, LlmResponse, Message, MessageRole, Usage,
};
use crate::domain::DomainError;

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Messages API adapter
#[derive(Debug)]
pub struct AnthropicAdapter<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> AnthropicAdapter<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_ANTHROPIC_BASE_URL)
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

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(&self, call: &BackendCall) -> serde_json::Value {
        let request = call.request();
        let (system, messages) = split_system_messages(&request.messages);

        let anthropic_messages: Vec<AnthropicMessage> =
            messages.iter().map(|m| AnthropicMessage::from_domain(m)).collect();

        let mut body = serde_json::json!({
            "model": call.model(),
            "messages": anthropic_messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        if let Some(system_content) = system {
            body["system"] = serde_json::json!(system_content);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        if let Some(ref stop) = request.stop {
            body["stop_sequences"] = serde_json::json!(stop);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: AnthropicResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::invalid_response("anthropic", format!("failed to parse response: {}", e))
        })?;

        let content = response
            .content
            .into_iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let message = Message::assistant(content);

        Ok(LlmResponse::new(response.id, response.model, message)
            .with_finish_reason(parse_stop_reason(response.stop_reason.as_deref()))
            .with_usage(Usage::new(
                response.usage.input_tokens,
                response.usage.output_tokens,
            )))
    }
}

#[async_trait]
impl<C: HttpClientTrait> BackendAdapter for AnthropicAdapter<C> {
    async fn invoke(&self, call: &BackendCall) -> Result<LlmResponse, DomainError> {
        let url = self.messages_url();
        let body = self.build_request(call);

        let response = self
            .client
            .post_json(&url, self.headers(), &body, call.timeout())
            .await
            .map_err(|e| classify_http_error("anthropic", call.timeout_ms(), e))?;

        self.parse_response(response)
    }

    fn backend_name(&self) -> &'static str {
        "anthropic"
    }
}

/// The Messages API takes system prompts as a top-level field, not as
/// conversation messages.
fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system_content = String::new();
    let mut other_messages = Vec::new();

    for msg in messages {
        if msg.role == MessageRole::System {
            if !system_content.is_empty() {
                system_content.push('\n');
            }
            system_content.push_str(msg.content());
        } else {
            other_messages.push(msg);
        }
    }

    let system = if system_content.is_empty() {
        None
    } else {
        Some(system_content)
    };

    (system, other_messages)
}

fn parse_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        Some("refusal") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

impl AnthropicMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "user", // System handled separately
        };

        Self {
            role: role.to_string(),
            content: message.content().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
