//! Output formatting for tagging results.
//!
//! Each batch outcome becomes one [`TaggingRecord`]. Records can be written as
//! a human-readable token table, a single JSON array, or JSON Lines.

use crate::batch::BatchOutcome;
use crate::schema::{Sentence, TaggedSentences};
use serde::Serialize;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One "Token: <text> <TAG>" line per token
    Table,
    /// Single JSON array of records
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Some(Self::Table),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serializable outcome of one tagging call.
#[derive(Debug, Clone, Serialize)]
pub struct TaggingRecord {
    /// Zero-based batch index
    pub batch: usize,
    /// Index of the first input sentence in the batch
    pub first_sentence: usize,
    /// One past the last input sentence in the batch
    pub end_sentence: usize,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Success payload or classified failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Ok { sentences: Vec<Sentence> },
    Error { kind: String, message: String },
}

impl TaggingRecord {
    /// Record for a single `tag_text` call covering one input.
    pub fn single(doc: TaggedSentences) -> Self {
        Self {
            batch: 0,
            first_sentence: 0,
            end_sentence: 1,
            outcome: RecordOutcome::Ok {
                sentences: doc.sentences,
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Ok { .. })
    }
}

impl From<BatchOutcome> for TaggingRecord {
    fn from(outcome: BatchOutcome) -> Self {
        let record = match outcome.result {
            Ok(doc) => RecordOutcome::Ok {
                sentences: doc.sentences,
            },
            Err(e) => RecordOutcome::Error {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        };
        Self {
            batch: outcome.index,
            first_sentence: outcome.sentences.start,
            end_sentence: outcome.sentences.end,
            outcome: record,
        }
    }
}

/// A writer that renders records in the selected format.
///
/// JSON output is buffered until [`OutputWriter::finish`] so the records form
/// one array; the other formats stream.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<TaggingRecord>,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The underlying writer (file, stdout, etc.)
    /// * `format` - Output format
    /// * `pretty` - Whether to pretty-print JSON (only affects JSON format)
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    /// Write a single record.
    pub fn write(&mut self, record: TaggingRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.pending.push(record);
                return Ok(());
            }
            OutputFormat::JsonLines => {
                // JSONL is never pretty-printed (one object per line)
                serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Table => write_table(&mut self.writer, &record)?,
        }
        self.items_written += 1;
        Ok(())
    }

    /// Emit buffered output and flush.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            let pending = std::mem::take(&mut self.pending);
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &pending)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &pending).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
            self.items_written += pending.len();
        }
        self.writer.flush()
    }

    /// Get the number of records written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn write_table<W: Write>(writer: &mut W, record: &TaggingRecord) -> io::Result<()> {
    match &record.outcome {
        RecordOutcome::Ok { sentences } => {
            for sentence in sentences {
                for token in &sentence.tokens {
                    writeln!(writer, "Token: {:<15} {}", token.text, token.tag)?;
                }
                writeln!(writer, "----------------------")?;
            }
        }
        RecordOutcome::Error { kind, message } => {
            writeln!(
                writer,
                "Batch {} (sentences {}..{}) failed [{kind}]: {message}",
                record.batch + 1,
                record.first_sentence,
                record.end_sentence
            )?;
        }
    }
    Ok(())
}
