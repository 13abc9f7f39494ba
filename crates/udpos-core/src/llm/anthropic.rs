//! Anthropic LLM provider using the Messages API.
//!
//! The Messages API has no JSON mode, so the response schema is offered as
//! the input schema of a single tool and the model is forced to call it. The
//! tool input is the structured result.

use super::provider::{ensure_success, transport_error, LlmProvider, LlmResponse, StructuredRequest};
use crate::error::{TagError, TagResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Point at a different Messages endpoint (proxies, gateways).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'static str,
    input_schema: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'static str,
    name: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: String,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContent {
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

fn build_body<'a>(model: &'a str, request: &'a StructuredRequest) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: request.max_tokens,
        system: &request.instructions,
        messages: vec![Message {
            role: "user",
            content: &request.input,
        }],
        tools: vec![Tool {
            name: &request.schema_name,
            description: "Record the tokenized and POS-tagged sentences.",
            input_schema: &request.schema,
        }],
        tool_choice: ToolChoice {
            choice_type: "tool",
            name: &request.schema_name,
        },
        temperature: request.temperature,
    }
}

fn extract(
    tool_name: &str,
    resp: MessagesResponse,
    latency_ms: u64,
) -> TagResult<LlmResponse> {
    let truncated = resp.stop_reason.as_deref() == Some("max_tokens");
    let mut fallback_text = String::new();
    let mut tool_input = None;

    for block in resp.content {
        match block {
            ResponseContent::ToolUse { name, input } if name == tool_name => {
                tool_input = Some(input);
            }
            ResponseContent::Text { text } => fallback_text.push_str(&text),
            _ => {}
        }
    }

    // A model that answers in prose instead of calling the tool still gets
    // its text decoded; it will usually fail schema validation downstream.
    let text = match tool_input {
        Some(input) => input.to_string(),
        None if !fallback_text.trim().is_empty() => fallback_text.trim().to_string(),
        None if truncated => String::new(),
        None => {
            return Err(TagError::remote(
                "Anthropic returned empty response — no tool call generated",
                None,
            ))
        }
    };

    Ok(LlmResponse {
        text,
        model: resp.model,
        tokens_used: Some(resp.usage.input_tokens + resp.usage.output_tokens),
        latency_ms,
        truncated,
    })
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
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
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&build_body(&self.model, request))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error("Anthropic", e))?;

        let resp = ensure_success("Anthropic", resp, request.input_chars()).await?;

        let messages_resp: MessagesResponse = resp.json().await.map_err(|e| {
            TagError::remote(format!("Failed to parse Anthropic response: {e}"), None)
        })?;

        extract(
            &request.schema_name,
            messages_resp,
            start.elapsed().as_millis() as u64,
        )
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;

    #[test]
    fn test_body_forces_tool_call() {
        let request = StructuredRequest::tag_text("Hi.", 1024, 0.0);
        let body = serde_json::to_value(build_body("claude-sonnet-4-20250514", &request)).unwrap();

        assert_eq!(body["tool_choice"]["type"], "tool");
        assert_eq!(body["tool_choice"]["name"], "tagged_sentences");
        assert_eq!(body["tools"][0]["name"], "tagged_sentences");
        assert_eq!(
            body["tools"][0]["input_schema"]["required"][0],
            "sentences"
        );
        assert_eq!(body["messages"][0]["content"], "Hi.");
        assert!(body["system"].as_str().unwrap().contains("17 universal tags"));
    }

    #[test]
    fn test_extract_tool_input() {
        let raw = r#"{
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "tool_use",
            "content": [
                {"type": "tool_use", "id": "toolu_01", "name": "tagged_sentences",
                 "input": {"sentences": [{"tokens": [{"text": "Hi", "pos_tag": "INTJ"}]}]}}
            ],
            "usage": {"input_tokens": 900, "output_tokens": 40}
        }"#;
        let resp = extract("tagged_sentences", serde_json::from_str(raw).unwrap(), 7).unwrap();
        let value: serde_json::Value = serde_json::from_str(&resp.text).unwrap();
        assert_eq!(value["sentences"][0]["tokens"][0]["pos_tag"], "INTJ");
        assert_eq!(resp.tokens_used, Some(940));
        assert!(!resp.truncated);
    }

    #[test]
    fn test_extract_ignores_unknown_blocks() {
        let raw = r#"{
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "tool_use",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "tool_use", "id": "toolu_01", "name": "tagged_sentences", "input": {"sentences": []}}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;
        let resp = extract("tagged_sentences", serde_json::from_str(raw).unwrap(), 7).unwrap();
        assert_eq!(resp.text, r#"{"sentences":[]}"#);
    }

    #[test]
    fn test_extract_no_content() {
        let raw = r#"{
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "content": [],
            "usage": {"input_tokens": 1, "output_tokens": 0}
        }"#;
        let err = extract("tagged_sentences", serde_json::from_str(raw).unwrap(), 7).unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[tokio::test]
    async fn test_generate_sends_api_key_and_version() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "sk-ant-test")
                    .header("anthropic-version", "2023-06-01")
                    .body_contains(r#""tool_choice""#);
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"model":"claude-sonnet-4-20250514","stop_reason":"tool_use","content":[{"type":"tool_use","id":"toolu_01","name":"tagged_sentences","input":{"sentences":[]}}],"usage":{"input_tokens":5,"output_tokens":3}}"#);
            })
            .await;

        let provider = AnthropicProvider::new("sk-ant-test", "claude-sonnet-4-20250514")
            .with_endpoint(&server.url("/v1/messages"));
        let resp = provider
            .generate(&StructuredRequest::tag_text("The fox jumps.", 256, 0.0))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.text, r#"{"sentences":[]}"#);
        assert_eq!(resp.tokens_used, Some(8));
    }
}
