//! Test doubles shared by the tagger and batch tests.

use crate::error::{TagError, TagResult};
use crate::llm::{LlmProvider, LlmResponse, StructuredRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32, &StructuredRequest) -> TagResult<String> + Send + Sync>;

/// A configurable mock LLM provider.
///
/// Each call to `generate()` invokes the response factory with the current
/// call index and the request, so tests can vary results per attempt or
/// derive the output from the input.
pub(crate) struct MockProvider {
    response_fn: ResponseFn,
    call_count: Arc<AtomicU32>,
    inputs: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    truncated: bool,
}

impl MockProvider {
    pub fn new(
        f: impl Fn(u32, &StructuredRequest) -> TagResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(f),
            call_count: Arc::new(AtomicU32::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            truncated: false,
        }
    }

    /// Always answer with the same JSON text.
    pub fn fixed(json: &str) -> Self {
        let json = json.to_string();
        Self::new(move |_, _| Ok(json.clone()))
    }

    /// Always fail with `error`.
    pub fn failing(error: TagError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    /// Split the input on whitespace, peel trailing punctuation into its own
    /// token and tag from a small lexicon. Blank lines separate sentences.
    pub fn lexicon() -> Self {
        Self::new(|_, request| Ok(lexicon_tag(&request.input)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn truncating(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    pub fn inputs_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.inputs.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-v1"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &StructuredRequest) -> TagResult<LlmResponse> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(request.input.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = (self.response_fn)(idx, request)?;
        Ok(LlmResponse {
            text,
            model: "mock-v1".to_string(),
            tokens_used: Some(42),
            latency_ms: 10,
            truncated: self.truncated,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

fn lexicon_tag(input: &str) -> String {
    let sentences: Vec<serde_json::Value> = input
        .split("\n\n")
        .filter(|s| !s.trim().is_empty())
        .map(|sentence| {
            let mut tokens = Vec::new();
            for word in sentence.split_whitespace() {
                let core = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
                if !core.is_empty() {
                    tokens.push(serde_json::json!({"text": core, "pos_tag": lexicon(core)}));
                }
                for punct in word[core.len()..].chars() {
                    tokens.push(serde_json::json!({"text": punct.to_string(), "pos_tag": "PUNCT"}));
                }
            }
            serde_json::json!({ "tokens": tokens })
        })
        .collect();
    serde_json::json!({ "sentences": sentences }).to_string()
}

fn lexicon(word: &str) -> &'static str {
    match word.to_lowercase().as_str() {
        "the" | "a" | "an" => "DET",
        "quick" | "brown" | "lazy" => "ADJ",
        "fox" | "dog" | "cat" => "NOUN",
        "jumps" | "sleeps" | "runs" => "VERB",
        "over" | "in" | "on" => "ADP",
        _ => "X",
    }
}
