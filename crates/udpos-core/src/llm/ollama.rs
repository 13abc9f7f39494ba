//! Ollama LLM provider for local model inference.
//!
//! Talks to a local Ollama instance via its HTTP API, passing the response
//! schema as the `format` field. No authentication required.

use super::provider::{ensure_success, transport_error, LlmProvider, LlmResponse, StructuredRequest};
use crate::error::{TagError, TagResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider for local inference.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            // Local models can be slow
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    format: &'a serde_json::Value,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama /api/generate response.
#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

fn extract(model: &str, resp: OllamaResponse, latency_ms: u64) -> TagResult<LlmResponse> {
    let truncated = resp.done_reason.as_deref() == Some("length");
    let text = resp.response.trim().to_string();
    if text.is_empty() && !truncated {
        return Err(TagError::remote(
            "Ollama returned empty response — no content generated",
            None,
        ));
    }

    let tokens_used = match (resp.prompt_eval_count, resp.eval_count) {
        (None, None) => None,
        (p, e) => Some(p.unwrap_or(0) + e.unwrap_or(0)),
    };

    Ok(LlmResponse {
        text,
        model: model.to_string(),
        tokens_used,
        latency_ms,
        truncated,
    })
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(&self, request: &StructuredRequest) -> TagResult<LlmResponse> {
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();

        let body = OllamaRequest {
            model: &self.model,
            prompt: request.combined_prompt(),
            format: &request.schema,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error("Ollama", e))?;

        let resp = ensure_success("Ollama", resp, request.input_chars()).await?;

        let ollama_resp: OllamaResponse = resp.json().await.map_err(|e| {
            TagError::remote(format!("Failed to parse Ollama response: {e}"), None)
        })?;

        extract(&self.model, ollama_resp, start.elapsed().as_millis() as u64)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
