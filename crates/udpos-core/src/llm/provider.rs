//! LLM provider trait and request/response types.
//!
//! Defines the interface that all LLM providers implement, plus the
//! factory that creates the right provider from CLI flags and config.

use crate::config::LlmConfig;
use crate::error::{TagError, TagResult};
use crate::llm::prompt;
use crate::schema;
use async_trait::async_trait;
use std::time::Duration;

/// A request for schema-constrained JSON output.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// Fixed instructions (tagset and segmentation rules)
    pub instructions: String,
    /// Caller's text, passed through verbatim
    pub input: String,
    /// Name of the output schema (used by tool/function-style APIs)
    pub schema_name: String,
    /// JSON schema the output must conform to
    pub schema: serde_json::Value,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl StructuredRequest {
    /// Build a POS tagging request for `text`.
    pub fn tag_text(text: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            instructions: prompt::instructions(),
            input: text.to_string(),
            schema_name: "tagged_sentences".to_string(),
            schema: schema::response_schema(),
            max_tokens,
            temperature,
        }
    }

    /// Instructions and input folded into one prompt, for single-turn APIs.
    pub fn combined_prompt(&self) -> String {
        prompt::tagging_prompt(&self.input)
    }

    /// Input size used for context-budget checks and error reports.
    pub fn input_chars(&self) -> usize {
        self.input.chars().count()
    }
}

/// The raw response from a structured generation call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// JSON text produced by the model
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
    /// Generation stopped at the output token limit
    pub truncated: bool,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini", "ollama").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Check whether the provider is usable.
    ///
    /// Cloud providers only check for a configured key; local providers
    /// probe their endpoint.
    async fn is_available(&self) -> bool;

    /// Generate schema-constrained JSON for the given request.
    async fn generate(&self, request: &StructuredRequest) -> TagResult<LlmResponse>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Map a transport-level reqwest failure.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> TagError {
    let message = if e.is_timeout() {
        format!("{provider} request timed out: {e}")
    } else if e.is_connect() {
        format!("{provider} failed to connect: {e}")
    } else {
        format!("{provider} request failed: {e}")
    };
    TagError::remote(message, e.status().map(|s| s.as_u16()))
}

/// Turn a non-success HTTP status into the matching error kind.
///
/// 413s and 400s that complain about context length mean the input must be
/// split; everything else is the remote being unavailable.
pub(crate) fn status_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
    input_chars: usize,
) -> TagError {
    if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE
        || (status == reqwest::StatusCode::BAD_REQUEST && mentions_context_limit(body))
    {
        return TagError::too_large(
            input_chars,
            None,
            format!("{provider} HTTP {status}: {body}"),
        );
    }
    TagError::remote(
        format!("{provider} HTTP {status}: {body}"),
        Some(status.as_u16()),
    )
}

fn mentions_context_limit(body: &str) -> bool {
    let body = body.to_lowercase();
    [
        "context length",
        "context_length",
        "context window",
        "maximum context",
        "too many tokens",
        "prompt is too long",
        "token limit",
        "exceeds the maximum number of tokens",
    ]
    .iter()
    .any(|needle| body.contains(needle))
}

/// Check the status and hand back the response, or read the body into an error.
pub(crate) async fn ensure_success(
    provider: &str,
    resp: reqwest::Response,
    input_chars: usize,
) -> TagResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(status_error(provider, status, &text, input_chars))
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn require_key(provider: &str, api_key: &str, env_hint: &str) -> TagResult<String> {
    resolve_env_var(api_key).ok_or_else(|| {
        TagError::remote(
            format!("{provider} API key not set. Set {env_hint} env var."),
            None,
        )
    })
}

/// Factory that creates the appropriate provider from CLI flags and config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider based on provider name, config, and optional model override.
    ///
    /// # Arguments
    /// * `provider` - Provider identifier (see [`super::PROVIDERS`])
    /// * `config` - The full LLM config section
    /// * `model_override` - Optional model name that overrides the config default
    /// * `timeout` - HTTP request timeout
    ///
    /// Fails closed with `RemoteUnavailable` when the provider's credential is missing.
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
        timeout: Duration,
    ) -> TagResult<Box<dyn LlmProvider>> {
        let pick = |configured: &str| {
            model_override
                .map(String::from)
                .unwrap_or_else(|| configured.to_string())
        };

        match provider {
            "gemini" => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = require_key("Gemini", &cfg.api_key, "GOOGLE_API_KEY")?;
                Ok(Box::new(
                    super::gemini::GeminiProvider::new(&cfg.endpoint, &api_key, &pick(&cfg.model))
                        .with_timeout(timeout),
                ))
            }
            "grok" => {
                let cfg = config.grok.clone().unwrap_or_default();
                let api_key = require_key("Grok", &cfg.api_key, "GROK_API_KEY")?;
                Ok(Box::new(
                    super::grok::GrokProvider::new(&cfg.endpoint, &api_key, &pick(&cfg.model))
                        .with_timeout(timeout),
                ))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = require_key("OpenAI", &cfg.api_key, "OPENAI_API_KEY")?;
                Ok(Box::new(
                    super::openai::OpenAiProvider::new(&api_key, &pick(&cfg.model))
                        .with_timeout(timeout),
                ))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = require_key("Anthropic", &cfg.api_key, "ANTHROPIC_API_KEY")?;
                let mut provider =
                    super::anthropic::AnthropicProvider::new(&api_key, &pick(&cfg.model))
                        .with_timeout(timeout);
                if let Some(endpoint) = &cfg.endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Ok(Box::new(provider))
            }
            "ollama" => {
                let cfg = config.ollama.clone().unwrap_or_default();
                Ok(Box::new(
                    super::ollama::OllamaProvider::new(&cfg.endpoint, &pick(&cfg.model))
                        .with_timeout(timeout),
                ))
            }
            other => Err(TagError::remote(
                format!("Unknown LLM provider: {other}"),
                None,
            )),
        }
    }
}
