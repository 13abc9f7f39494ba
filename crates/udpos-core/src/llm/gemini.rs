//! Gemini LLM provider using the `generateContent` API.
//!
//! Structured output via `responseMimeType: application/json` plus a
//! `responseSchema`. Gemini's schema dialect is an OpenAPI subset, so
//! keywords it rejects are stripped before sending.

use super::provider::{ensure_success, transport_error, LlmProvider, LlmResponse, StructuredRequest};
use crate::error::{TagError, TagResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Gemini provider using the Generative Language API.
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
    max_output_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

/// Remove JSON-schema keywords the Gemini schema dialect does not accept.
fn gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    match schema {
        serde_json::Value::Object(map) => map
            .iter()
            .filter(|(k, _)| k.as_str() != "additionalProperties")
            .map(|(k, v)| (k.clone(), gemini_schema(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        serde_json::Value::Array(items) => items.iter().map(gemini_schema).collect(),
        other => other.clone(),
    }
}

fn build_body(request: &StructuredRequest) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: request.combined_prompt(),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: gemini_schema(&request.schema),
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        },
    }
}

fn extract(model: &str, resp: GenerateResponse, latency_ms: u64) -> TagResult<LlmResponse> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(TagError::remote(
            format!("Gemini blocked the prompt: {reason}"),
            None,
        ));
    }

    let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
        TagError::remote("Gemini returned no candidates — no content generated", None)
    })?;

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let text = text.trim();
    let finish_reason = candidate.finish_reason.as_deref();

    // SAFETY, RECITATION, PROHIBITED_CONTENT and friends stop generation
    // on Gemini's side; only STOP and MAX_TOKENS are ordinary endings.
    if let Some(reason) = finish_reason.filter(|r| !matches!(*r, "STOP" | "MAX_TOKENS")) {
        if text.is_empty() {
            return Err(TagError::remote(
                format!("Gemini stopped without content: finishReason {reason}"),
                None,
            ));
        }
    }

    Ok(LlmResponse {
        text: text.to_string(),
        model: resp.model_version.unwrap_or_else(|| model.to_string()),
        tokens_used: resp.usage_metadata.and_then(|u| u.total_token_count),
        latency_ms,
        truncated: finish_reason == Some("MAX_TOKENS"),
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error("Gemini", e))?;

        let resp = ensure_success("Gemini", resp, request.input_chars()).await?;

        let gen_resp: GenerateResponse = resp.json().await.map_err(|e| {
            TagError::remote(format!("Failed to parse Gemini response: {e}"), None)
        })?;

        extract(&self.model, gen_resp, start.elapsed().as_millis() as u64)
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
    use crate::tagger::{Tagger, TaggerOptions};
    use crate::error::TagErrorKind;

    #[test]
    fn test_url_includes_model() {
        let provider = GeminiProvider::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "key",
            "gemini-2.0-flash-lite",
        );
        assert_eq!(
            provider.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
    }

    #[test]
    fn test_schema_strips_additional_properties() {
        let request = StructuredRequest::tag_text("Hi.", 256, 0.0);
        let body = serde_json::to_value(build_body(&request)).unwrap();
        let schema = &body["generationConfig"]["responseSchema"];

        assert!(schema.get("additionalProperties").is_none());
        let token = &schema["properties"]["sentences"]["items"]["properties"]["tokens"]["items"];
        assert!(token.get("additionalProperties").is_none());
        assert_eq!(token["properties"]["pos_tag"]["enum"][0], "ADJ");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_extract_joins_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"sentences\":"}, {"text": "[]}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 400, "totalTokenCount": 420},
            "modelVersion": "gemini-2.0-flash-lite-001"
        }"#;
        let resp = extract("gemini-2.0-flash-lite", serde_json::from_str(raw).unwrap(), 5).unwrap();
        assert_eq!(resp.text, r#"{"sentences":[]}"#);
        assert_eq!(resp.model, "gemini-2.0-flash-lite-001");
        assert_eq!(resp.tokens_used, Some(420));
        assert!(!resp.truncated);
    }

    #[test]
    fn test_extract_max_tokens_is_truncated() {
        let raw = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"sen"}]}, "finishReason": "MAX_TOKENS"}]
        }"#;
        let resp = extract("gemini-2.0-flash-lite", serde_json::from_str(raw).unwrap(), 5).unwrap();
        assert!(resp.truncated);
        assert_eq!(resp.model, "gemini-2.0-flash-lite");
    }

    #[test]
    fn test_extract_safety_stop_is_remote_unavailable() {
        for reason in ["SAFETY", "RECITATION", "PROHIBITED_CONTENT"] {
            let raw = format!(r#"{{"candidates": [{{"finishReason": "{reason}"}}]}}"#);
            let err = extract("gemini-2.0-flash-lite", serde_json::from_str(&raw).unwrap(), 5)
                .unwrap_err();
            assert_eq!(err.kind(), TagErrorKind::RemoteUnavailable, "{reason}");
            assert!(err.to_string().contains(reason));
        }
    }

    #[test]
    fn test_extract_blocked_prompt() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = extract("gemini-2.0-flash-lite", serde_json::from_str(raw).unwrap(), 5)
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    const MODEL: &str = "gemini-2.0-flash-lite";
    const PATH: &str = "/models/gemini-2.0-flash-lite:generateContent";

    #[tokio::test]
    async fn test_generate_sends_key_header_and_schema() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PATH)
                    .header("x-goog-api-key", "g-key")
                    .body_contains("responseSchema")
                    .body_contains("The fox jumps.");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"candidates":[{"content":{"parts":[{"text":"{\"sentences\":[]}"}]},"finishReason":"STOP"}]}"#);
            })
            .await;

        let provider = GeminiProvider::new(&server.base_url(), "g-key", MODEL);
        let resp = provider
            .generate(&StructuredRequest::tag_text("The fox jumps.", 256, 0.0))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.text, r#"{"sentences":[]}"#);
        assert_eq!(resp.model, MODEL);
    }

    #[tokio::test]
    async fn test_generate_503_is_remote_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(503).body("model overloaded");
            })
            .await;

        let provider = GeminiProvider::new(&server.base_url(), "g-key", MODEL);
        let err = provider
            .generate(&StructuredRequest::tag_text("The fox jumps.", 256, 0.0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TagError::RemoteUnavailable {
                status_code: Some(503),
                ..
            }
        ));
        assert!(err.to_string().contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_generate_413_is_input_too_large() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(413).body("request entity too large");
            })
            .await;

        let provider = GeminiProvider::new(&server.base_url(), "g-key", MODEL);
        let err = provider
            .generate(&StructuredRequest::tag_text("The fox jumps.", 256, 0.0))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TagError::too_large(
                14,
                None,
                "Gemini HTTP 413 Payload Too Large: request entity too large"
            )
        );
    }

    #[tokio::test]
    async fn test_generate_garbage_body_is_remote_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).body("<html>upstream error</html>");
            })
            .await;

        let provider = GeminiProvider::new(&server.base_url(), "g-key", MODEL);
        let err = provider
            .generate(&StructuredRequest::tag_text("The fox jumps.", 256, 0.0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), TagErrorKind::RemoteUnavailable);
        assert!(err.to_string().contains("Failed to parse Gemini response"));
    }

    #[tokio::test]
    async fn test_safety_stop_reaches_tagger_as_remote_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
            })
            .await;

        let provider = GeminiProvider::new(&server.base_url(), "g-key", MODEL);
        let tagger = Tagger::new(Box::new(provider), TaggerOptions::default());
        let err = tagger.tag_text("The fox jumps.").await.unwrap_err();

        assert_eq!(err.kind(), TagErrorKind::RemoteUnavailable);
    }
}
