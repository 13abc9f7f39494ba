//! Error types for udpos.
//!
//! Tagging failures are classified into exactly three kinds so callers can
//! decide retry/skip/abort policy themselves. Configuration and I/O errors
//! live alongside them for the CLI and config loader.

use thiserror::Error;

/// Top-level error type for udpos operations.
#[derive(Error, Debug)]
pub enum UdposError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tagging errors
    #[error("Tagging error: {0}")]
    Tagging(#[from] TagError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A classified tagging failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// Network/auth failure, non-2xx response, provider-side error or timeout.
    #[error("Remote unavailable: {message}")]
    RemoteUnavailable {
        message: String,
        status_code: Option<u16>,
    },

    /// The remote output did not decode into the tagging schema.
    #[error("Schema violation: {message}")]
    SchemaViolation { message: String },

    /// The input exceeds the provider's context budget.
    ///
    /// `max_chars` is set when the limit is known locally; remote rejections
    /// do not report one.
    #[error("Input too large ({chars} chars): {message}")]
    InputTooLarge {
        chars: usize,
        max_chars: Option<usize>,
        message: String,
    },
}

/// Discriminant of [`TagError`], handy for counting and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagErrorKind {
    RemoteUnavailable,
    SchemaViolation,
    InputTooLarge,
}

impl TagError {
    pub fn remote(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::RemoteUnavailable {
            message: message.into(),
            status_code,
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    pub fn too_large(chars: usize, max_chars: Option<usize>, message: impl Into<String>) -> Self {
        Self::InputTooLarge {
            chars,
            max_chars,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> TagErrorKind {
        match self {
            Self::RemoteUnavailable { .. } => TagErrorKind::RemoteUnavailable,
            Self::SchemaViolation { .. } => TagErrorKind::SchemaViolation,
            Self::InputTooLarge { .. } => TagErrorKind::InputTooLarge,
        }
    }

    /// Whether retrying the same payload could plausibly succeed.
    ///
    /// See [`crate::llm::retry::is_retryable`] for the finer-grained check
    /// used by automatic retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }
}

impl std::fmt::Display for TagErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagErrorKind::RemoteUnavailable => write!(f, "remote_unavailable"),
            TagErrorKind::SchemaViolation => write!(f, "schema_violation"),
            TagErrorKind::InputTooLarge => write!(f, "input_too_large"),
        }
    }
}

/// Convenience type alias for udpos results.
pub type Result<T> = std::result::Result<T, UdposError>;

/// Convenience type alias for tagging results.
pub type TagResult<T> = std::result::Result<T, TagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(
            TagError::remote("down", Some(503)).kind(),
            TagErrorKind::RemoteUnavailable
        );
        assert_eq!(TagError::schema("bad").kind(), TagErrorKind::SchemaViolation);
        assert_eq!(
            TagError::too_large(10, Some(5), "limit is 5 chars").kind(),
            TagErrorKind::InputTooLarge
        );
    }

    #[test]
    fn test_only_remote_errors_are_retryable() {
        assert!(TagError::remote("connection refused", None).is_retryable());
        assert!(!TagError::schema("unknown variant `FOO`").is_retryable());
        assert!(!TagError::too_large(10, Some(5), "limit is 5 chars").is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = TagError::too_large(500_001, Some(400_000), "limit is 400000 chars");
        assert_eq!(
            err.to_string(),
            "Input too large (500001 chars): limit is 400000 chars"
        );
        assert!(matches!(
            err,
            TagError::InputTooLarge {
                max_chars: Some(400_000),
                ..
            }
        ));
    }
}
