//! CLI enum types for the tag command: output format and LLM provider.

use clap::ValueEnum;

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// "Token: <text> <TAG>" lines (default)
    #[default]
    Table,
    /// Single JSON array of batch records
    Json,
    /// One JSON record per batch (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for udpos_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => udpos_core::OutputFormat::Table,
            OutputFormat::Json => udpos_core::OutputFormat::Json,
            OutputFormat::Jsonl => udpos_core::OutputFormat::JsonLines,
        }
    }
}

/// Supported LLM providers.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LlmProvider {
    /// Google Gemini API
    Gemini,
    /// xAI Grok API
    Grok,
    /// OpenAI API
    Openai,
    /// Anthropic API
    Anthropic,
    /// Local Ollama instance
    Ollama,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Grok => write!(f, "grok"),
            LlmProvider::Openai => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}
