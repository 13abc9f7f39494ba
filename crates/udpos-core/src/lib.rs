//! udpos core - Universal Dependencies POS tagging through LLM structured output.
//!
//! The tagging itself is done by a remote model. This crate owns the contract
//! around that call: the closed 17-tag schema, the instruction prompt, the
//! provider backends, response validation, and paced batching.
//!
//! # Architecture
//!
//! ```text
//! sentences → BatchTagger (groups + pacing) → Tagger (prompt + call + decode) → TaggedSentences
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use udpos_core::{Config, LlmProviderFactory, Tagger, TaggerOptions};
//!
//! #[tokio::main]
//! async fn main() -> udpos_core::Result<()> {
//!     let config = Config::load()?;
//!     let options = TaggerOptions::from(&config.tagging);
//!     let provider =
//!         LlmProviderFactory::create("gemini", &config.llm, None, options.timeout)?;
//!     let tagger = Tagger::new(provider, options);
//!
//!     let doc = tagger.tag_text("The quick brown fox jumps.").await?;
//!     for token in doc.tokens() {
//!         println!("{} {}", token.text, token.tag);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod schema;
pub mod tagger;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use batch::{partition, Batch, BatchOptions, BatchOutcome, BatchTagger, SENTENCE_SEPARATOR};
pub use config::Config;
pub use error::{ConfigError, Result, TagError, TagErrorKind, TagResult, UdposError};
pub use llm::{LlmProvider, LlmProviderFactory, LlmResponse, StructuredRequest, PROVIDERS};
pub use output::{OutputFormat, OutputWriter, RecordOutcome, TaggingRecord};
pub use schema::{response_schema, PosTag, Sentence, TaggedSentences, Token};
pub use tagger::{Tagger, TaggerOptions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_tagset_is_closed_at_seventeen() {
        assert_eq!(PosTag::ALL.len(), 17);
    }
}
