//! LLM integration for structured POS tagging.
//!
//! Provides a provider abstraction over multiple LLM backends (Gemini, Grok,
//! OpenAI, Anthropic, Ollama), all asked for JSON constrained to the tagging
//! schema, plus the prompt text and retry helpers shared by the tagger and the
//! batch orchestrator.

pub(crate) mod anthropic;
pub(crate) mod gemini;
pub(crate) mod grok;
pub(crate) mod ollama;
pub(crate) mod openai;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use provider::{LlmProvider, LlmProviderFactory, LlmResponse, StructuredRequest};

/// Provider identifiers accepted by [`LlmProviderFactory::create`].
pub const PROVIDERS: [&str; 5] = ["gemini", "grok", "openai", "anthropic", "ollama"];
