//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::llm::PROVIDERS;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PROVIDERS.contains(&self.tagging.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "tagging.provider must be one of {}, got '{}'",
                PROVIDERS.join(", "),
                self.tagging.provider
            )));
        }
        if self.tagging.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tagging.timeout_ms must be > 0".into(),
            ));
        }
        if self.tagging.max_input_chars == 0 {
            return Err(ConfigError::ValidationError(
                "tagging.max_input_chars must be > 0".into(),
            ));
        }
        if self.tagging.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "tagging.max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.tagging.temperature) {
            return Err(ConfigError::ValidationError(
                "tagging.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.batch.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "batch.batch_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
