//! OpenAI LLM provider using the Chat Completions API.
//!
//! Structured output via `response_format: json_schema` in strict mode.
//! The instructions go in the system message, the input text in the user
//! message.

use super::provider::{ensure_success, transport_error, LlmProvider, LlmResponse, StructuredRequest};
use crate::error::{TagError, TagResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    label: &'static str,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint(api_key, model, "https://api.openai.com/v1/chat/completions")
    }

    /// Create with a custom endpoint (used by the Grok provider).
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            label: "OpenAI",
            timeout: Duration::from_secs(60),
        }
    }

    /// Name used in error messages.
    pub(crate) fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

fn build_body<'a>(model: &'a str, request: &'a StructuredRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &request.instructions,
            },
            ChatMessage {
                role: "user",
                content: &request.input,
            },
        ],
        response_format: ResponseFormat {
            format_type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &request.schema_name,
                schema: &request.schema,
                strict: true,
            },
        },
    }
}

/// Pull the generated JSON out of a decoded Chat Completions response.
fn extract(label: &str, chat_resp: ChatResponse, latency_ms: u64) -> TagResult<LlmResponse> {
    let choice = chat_resp.choices.into_iter().next().ok_or_else(|| {
        TagError::remote(
            format!("{label} returned empty choices array — no content generated"),
            None,
        )
    })?;

    if let Some(refusal) = choice.message.refusal {
        return Err(TagError::remote(
            format!("{label} refused the request: {refusal}"),
            None,
        ));
    }

    let text = choice.message.content.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() && choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(TagError::remote(
            format!("{label} withheld the output: finish_reason content_filter"),
            None,
        ));
    }

    Ok(LlmResponse {
        text: text.to_string(),
        model: chat_resp.model,
        tokens_used: chat_resp.usage.map(|u| u.total_tokens),
        latency_ms,
        truncated: choice.finish_reason.as_deref() == Some("length"),
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &StructuredRequest) -> TagResult<LlmResponse> {
        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&build_body(&self.model, request))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(self.label, e))?;

        let resp = ensure_success(self.label, resp, request.input_chars()).await?;

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| {
            TagError::remote(format!("Failed to parse {} response: {e}", self.label), None)
        })?;

        extract(self.label, chat_resp, start.elapsed().as_millis() as u64)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagErrorKind;

    #[test]
    fn test_body_uses_strict_json_schema() {
        let request = StructuredRequest::tag_text("Hi.", 256, 0.0);
        let body = serde_json::to_value(build_body("gpt-4o-mini", &request)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hi.");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            "tagged_sentences"
        );
    }

    #[test]
    fn test_extract_content() {
        let raw = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"content": " {\"sentences\":[]} ", "refusal": null}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 321}
        }"#;
        let resp = extract("OpenAI", serde_json::from_str(raw).unwrap(), 12).unwrap();
        assert_eq!(resp.text, r#"{"sentences":[]}"#);
        assert_eq!(resp.tokens_used, Some(321));
        assert!(!resp.truncated);
    }

    #[test]
    fn test_extract_flags_length_finish() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": "{\"sentences\":[{\"tok"}, "finish_reason": "length"}]
        }"#;
        let resp = extract("OpenAI", serde_json::from_str(raw).unwrap(), 12).unwrap();
        assert!(resp.truncated);
    }

    #[test]
    fn test_extract_refusal_is_error() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": null, "refusal": "I can't help with that."}, "finish_reason": "stop"}]
        }"#;
        let err = extract("OpenAI", serde_json::from_str(raw).unwrap(), 12).unwrap_err();
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_extract_content_filter_is_remote_unavailable() {
        let raw = r#"{
            "model": "grok-3-mini",
            "choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]
        }"#;
        let err = extract("Grok", serde_json::from_str(raw).unwrap(), 12).unwrap_err();
        assert_eq!(err.kind(), TagErrorKind::RemoteUnavailable);
        assert!(err.to_string().contains("content_filter"));
    }

    #[test]
    fn test_extract_empty_choices() {
        let raw = r#"{"model": "gpt-4o-mini", "choices": []}"#;
        let err = extract("OpenAI", serde_json::from_str(raw).unwrap(), 12).unwrap_err();
        assert!(err.to_string().contains("empty choices"));
    }
}
