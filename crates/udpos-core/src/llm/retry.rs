//! Retry utilities for transient LLM failures.
//!
//! Provides classification of retryable errors and exponential backoff.
//! Nothing retries automatically unless the caller opts in.

use crate::error::TagError;
use std::time::Duration;

/// Determine whether a tagging error is worth retrying.
///
/// Retryable errors: timeouts, connection failures, rate limits (429),
/// request timeouts (408), server errors (5xx).
/// Non-retryable: auth failures, bad requests, missing credentials,
/// schema violations, oversized input.
pub fn is_retryable(error: &TagError) -> bool {
    match error {
        TagError::RemoteUnavailable {
            status_code,
            message,
        } => {
            // Classify by HTTP status code when available (structured)
            if let Some(code) = status_code {
                return *code == 429 || *code == 408 || (500..=599).contains(code);
            }
            // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
            message.contains("timed out") || message.contains("connect")
        }
        TagError::SchemaViolation { .. } | TagError::InputTooLarge { .. } => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}
