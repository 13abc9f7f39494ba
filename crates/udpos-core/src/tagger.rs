//! The tagging client: free text in, validated tagged sentences out.
//!
//! One call to [`Tagger::tag_text`] is one request to the configured
//! provider. Every failure is classified before it reaches the caller.

use crate::config::TaggingConfig;
use crate::error::{TagError, TagResult};
use crate::llm::{LlmProvider, StructuredRequest};
use crate::schema::TaggedSentences;
use std::sync::Arc;
use std::time::Duration;

/// Per-call settings for the tagging client.
#[derive(Debug, Clone)]
pub struct TaggerOptions {
    /// Deadline for a single remote call
    pub timeout: Duration,
    /// Largest input accepted without calling the provider
    pub max_input_chars: usize,
    /// Maximum output tokens requested
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self::from(&TaggingConfig::default())
    }
}

impl From<&TaggingConfig> for TaggerOptions {
    fn from(config: &TaggingConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_input_chars: config.max_input_chars,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Structured-output POS tagging client.
#[derive(Clone)]
pub struct Tagger {
    provider: Arc<dyn LlmProvider>,
    options: TaggerOptions,
}

impl Tagger {
    pub fn new(provider: Box<dyn LlmProvider>, options: TaggerOptions) -> Self {
        Self {
            provider: Arc::from(provider),
            options,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn options(&self) -> &TaggerOptions {
        &self.options
    }

    /// Tag `text`, returning the validated document or a classified failure.
    ///
    /// Empty or whitespace-only text yields an empty document without
    /// contacting the provider.
    pub async fn tag_text(&self, text: &str) -> TagResult<TaggedSentences> {
        if text.trim().is_empty() {
            return Ok(TaggedSentences::default());
        }

        let chars = text.chars().count();
        if chars > self.options.max_input_chars {
            return Err(TagError::too_large(
                chars,
                Some(self.options.max_input_chars),
                format!(
                    "limit is {} chars for {}; split the input into smaller batches",
                    self.options.max_input_chars,
                    self.provider.name()
                ),
            ));
        }

        let request =
            StructuredRequest::tag_text(text, self.options.max_tokens, self.options.temperature);

        let response =
            match tokio::time::timeout(self.options.timeout, self.provider.generate(&request))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(TagError::remote(
                        format!(
                            "{} request timed out after {}ms",
                            self.provider.name(),
                            self.options.timeout.as_millis()
                        ),
                        None,
                    ));
                }
            };

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Tagging call completed"
        );
        tracing::trace!("Raw response: {}", response.text);

        if response.truncated {
            return Err(TagError::too_large(
                chars,
                None,
                format!(
                    "output hit the {}-token limit before the document was complete",
                    self.options.max_tokens
                ),
            ));
        }

        TaggedSentences::from_json(&response.text)
    }
}
