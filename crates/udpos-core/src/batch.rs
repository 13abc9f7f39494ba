//! Batch orchestration: tag a long list of sentences in paced, fixed-size groups.
//!
//! Groups are tagged strictly in order, one remote call per group, with a
//! pause between calls to stay under the provider's request rate. A failed
//! group never stops the run; each group gets its own result.

use crate::config::BatchConfig;
use crate::error::TagResult;
use crate::llm::retry;
use crate::schema::TaggedSentences;
use crate::tagger::Tagger;
use std::ops::Range;
use std::time::Duration;

/// Marker placed between sentences of one group.
pub const SENTENCE_SEPARATOR: &str = "\n\n";

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum sentences per remote call
    pub batch_size: usize,
    /// Pause between consecutive calls
    pub inter_batch_delay: Duration,
    /// Maximum retries per group (0 disables retrying)
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            inter_batch_delay: config.inter_batch_delay(),
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// One contiguous group of input sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of the group's sentences in the input list
    pub range: Range<usize>,
    /// The sentences joined with [`SENTENCE_SEPARATOR`]
    pub text: String,
}

/// Split `sentences` into contiguous groups of at most `batch_size`.
///
/// A `batch_size` of 0 is treated as 1.
pub fn partition(sentences: &[String], batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    sentences
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| {
            let start = i * size;
            Batch {
                range: start..start + chunk.len(),
                text: chunk.join(SENTENCE_SEPARATOR),
            }
        })
        .collect()
}

/// Result for one group, delivered as soon as the group completes.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Zero-based group index
    pub index: usize,
    /// Total number of groups in the run
    pub total: usize,
    /// Input sentences covered by this group
    pub sentences: Range<usize>,
    /// The tagged group or its failure
    pub result: TagResult<TaggedSentences>,
}

/// Sequential, rate-paced batch tagger.
pub struct BatchTagger {
    tagger: Tagger,
    options: BatchOptions,
}

impl BatchTagger {
    pub fn new(tagger: Tagger, options: BatchOptions) -> Self {
        Self { tagger, options }
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Tag every sentence, returning one result per group in input order.
    pub async fn tag_all(&self, sentences: &[String]) -> Vec<TagResult<TaggedSentences>> {
        let mut results = Vec::new();
        self.tag_all_with(sentences, |outcome| results.push(outcome.result))
            .await;
        results
    }

    /// Tag every sentence, handing each group's outcome to `on_result` as it
    /// completes. Returns `(succeeded, failed)` group counts.
    pub async fn tag_all_with<F>(&self, sentences: &[String], mut on_result: F) -> (usize, usize)
    where
        F: FnMut(BatchOutcome),
    {
        let batches = partition(sentences, self.options.batch_size);
        let total = batches.len();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for (index, batch) in batches.into_iter().enumerate() {
            tracing::info!(
                "Processing batch {}/{} (sentences {}..{})",
                index + 1,
                total,
                batch.range.start,
                batch.range.end
            );

            let result = self.tag_with_retry(&batch).await;
            match &result {
                Ok(doc) => {
                    succeeded += 1;
                    tracing::debug!(
                        "Batch {}/{} tagged: {} sentences, {} tokens",
                        index + 1,
                        total,
                        doc.sentences.len(),
                        doc.token_count()
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(kind = %e.kind(), "Batch {}/{} failed: {e}", index + 1, total);
                }
            }

            on_result(BatchOutcome {
                index,
                total,
                sentences: batch.range,
                result,
            });

            if index + 1 < total && !self.options.inter_batch_delay.is_zero() {
                tracing::debug!(
                    "Waiting {:?} to respect API rate limits...",
                    self.options.inter_batch_delay
                );
                tokio::time::sleep(self.options.inter_batch_delay).await;
            }
        }

        (succeeded, failed)
    }

    /// Tag one group, retrying transient failures if configured.
    async fn tag_with_retry(&self, batch: &Batch) -> TagResult<TaggedSentences> {
        let mut attempt = 0;
        loop {
            let result = self.tagger.tag_text(&batch.text).await;
            match result {
                Err(ref e) if attempt < self.options.retry_attempts && retry::is_retryable(e) => {
                    let delay = retry::backoff_duration(attempt, self.options.retry_delay_ms);
                    attempt += 1;
                    tracing::debug!(
                        "Retry {attempt}/{} for sentences {:?} after {delay:?}",
                        self.options.retry_attempts,
                        batch.range
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
