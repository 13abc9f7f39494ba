//! The `udpos tag` command.

mod batch;
mod setup;
pub mod types;

pub use types::{LlmProvider, OutputFormat};

use clap::Args;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use udpos_core::{Config, OutputWriter, TaggingRecord};

use batch::tag_sentences;
use setup::{apply_overrides, setup_tagger};

/// Arguments for the `tag` command.
#[derive(Args, Debug, Default)]
pub struct TagArgs {
    /// Text to tag (omit when using --input)
    #[arg(required_unless_present = "input", conflicts_with = "input")]
    pub text: Option<String>,

    /// File with one sentence per line ("-" reads stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// LLM provider (defaults to tagging.provider from config)
    #[arg(short, long, value_enum)]
    pub provider: Option<LlmProvider>,

    /// Model name (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sentences per remote call
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Milliseconds to wait between calls
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Retries per batch for transient failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Execute the tag command.
pub async fn execute(args: TagArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args)?;
    let batcher = setup_tagger(&config, &args)?;
    let mut writer = open_writer(&args)?;

    if let Some(text) = &args.text {
        let doc = batcher.tagger().tag_text(text).await.map_err(|e| {
            anyhow::anyhow!("Tagging failed [{}]: {e}", e.kind())
        })?;
        writer.write(TaggingRecord::single(doc))?;
        writer.finish()?;
        return Ok(());
    }

    let sentences = match &args.input {
        Some(path) => read_sentences(path)?,
        None => Vec::new(),
    };
    if sentences.is_empty() {
        tracing::warn!("No sentences found in input");
        return Ok(());
    }
    tracing::info!("Loaded {} sentence(s)", sentences.len());

    let summary = tag_sentences(&batcher, &sentences, &mut writer).await?;
    writer.finish()?;
    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }

    if summary.succeeded == 0 && summary.failed > 0 {
        anyhow::bail!("All {} batch(es) failed", summary.failed);
    }
    Ok(())
}

fn open_writer(args: &TagArgs) -> anyhow::Result<OutputWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    Ok(OutputWriter::new(sink, args.format.into(), args.pretty))
}

/// Read one sentence per non-blank line, trimmed.
pub fn read_sentences(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read input file {:?}: {e}\n\n  Hint: Check the file path and try again.",
                path
            )
        })?
    };
    Ok(split_sentences(&content))
}

fn split_sentences(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: TagArgs,
    }

    #[test]
    fn tag_args_default_format_is_table() {
        let cli = TestCli::try_parse_from(["udpos", "Hello there."]).unwrap();
        assert!(matches!(cli.args.format, OutputFormat::Table));
        assert_eq!(cli.args.text.as_deref(), Some("Hello there."));
        assert!(cli.args.provider.is_none());
    }

    #[test]
    fn tag_args_require_text_or_input() {
        assert!(TestCli::try_parse_from(["udpos"]).is_err());
        assert!(TestCli::try_parse_from(["udpos", "--input", "s.txt"]).is_ok());
        assert!(TestCli::try_parse_from(["udpos", "text", "--input", "s.txt"]).is_err());
    }

    #[test]
    fn tag_args_parse_provider_and_batching() {
        let cli = TestCli::try_parse_from([
            "udpos",
            "-i",
            "s.txt",
            "--provider",
            "grok",
            "--batch-size",
            "10",
            "--delay-ms",
            "200",
            "--format",
            "jsonl",
        ])
        .unwrap();
        assert!(matches!(cli.args.provider, Some(LlmProvider::Grok)));
        assert_eq!(cli.args.batch_size, Some(10));
        assert_eq!(cli.args.delay_ms, Some(200));
        assert!(matches!(cli.args.format, OutputFormat::Jsonl));
    }

    #[test]
    fn split_sentences_skips_blank_lines() {
        let sentences = split_sentences("  First one.\n\n\t\nSecond one.  \r\nThird.");
        assert_eq!(sentences, vec!["First one.", "Second one.", "Third."]);
    }

    #[test]
    fn read_sentences_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentences.txt");
        std::fs::write(&path, "The fox jumps.\nA dog sleeps.\n").unwrap();
        assert_eq!(read_sentences(&path).unwrap().len(), 2);
    }

    #[test]
    fn read_sentences_missing_file_has_hint() {
        let err = read_sentences(Path::new("/nonexistent/sentences.txt")).unwrap_err();
        assert!(err.to_string().contains("Hint"));
    }
}
