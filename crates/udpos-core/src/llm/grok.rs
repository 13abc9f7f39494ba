//! Grok LLM provider (xAI, OpenAI-compatible API).
//!
//! xAI serves the Chat Completions format with structured outputs, so this
//! delegates to `OpenAiProvider` with a custom endpoint.

use super::openai::OpenAiProvider;
use super::provider::{LlmProvider, LlmResponse, StructuredRequest};
use crate::error::TagResult;
use async_trait::async_trait;
use std::time::Duration;

/// Grok provider wrapping an OpenAI-compatible endpoint.
pub struct GrokProvider {
    inner: OpenAiProvider,
}

impl GrokProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        let url = format!("{}/chat/completions", endpoint.trim_end_matches('/'));
        Self {
            inner: OpenAiProvider::with_endpoint(api_key, model, &url).with_label("Grok"),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl LlmProvider for GrokProvider {
    fn name(&self) -> &str {
        "grok"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn generate(&self, request: &StructuredRequest) -> TagResult<LlmResponse> {
        self.inner.generate(request).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}
