//! Batch tagging of a sentence file with progress and streaming output.

use std::io::Write;
use std::time::{Duration, Instant};

use udpos_core::{BatchTagger, OutputWriter, TaggingRecord};

/// Counts reported after a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Tag all sentences in groups, writing one record per group as it completes.
pub async fn tag_sentences<W: Write>(
    batcher: &BatchTagger,
    sentences: &[String],
    writer: &mut OutputWriter<W>,
) -> anyhow::Result<BatchSummary> {
    let batch_size = batcher.options().batch_size.max(1);
    let total_batches = sentences.len().div_ceil(batch_size);
    let progress = create_progress_bar(total_batches as u64)?;
    let start_time = Instant::now();

    // The first write error stops further output but not the run itself;
    // it is surfaced once every batch has been attempted.
    let mut write_error: Option<std::io::Error> = None;
    let mut tokens = 0usize;

    let (succeeded, failed) = batcher
        .tag_all_with(sentences, |outcome| {
            if let Ok(doc) = &outcome.result {
                tokens += doc.token_count();
            }
            progress.inc(1);
            progress.set_message(format!("{tokens} tokens"));

            if write_error.is_none() {
                if let Err(e) = writer.write(TaggingRecord::from(outcome)) {
                    write_error = Some(e);
                }
            }
        })
        .await;

    progress.finish_and_clear();

    if let Some(e) = write_error {
        return Err(anyhow::anyhow!("Failed to write output: {e}"));
    }

    print_summary(succeeded, failed, tokens, start_time.elapsed());
    Ok(BatchSummary { succeeded, failed })
}

/// Create a progress bar counting batches.
fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Print a summary table to stderr after tagging.
fn print_summary(succeeded: usize, failed: usize, tokens: usize, elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Batches ok:   {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("    Tokens:       {:>8}", tokens);
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_template_is_valid() {
        let pb = create_progress_bar(3).unwrap();
        assert_eq!(pb.length(), Some(3));
    }
}
