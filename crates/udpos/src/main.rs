//! udpos CLI - Universal Dependencies POS tagging via LLM structured output.
//!
//! Sends text to a remote model, asks for tokens tagged with the 17 UD
//! part-of-speech tags, and validates the answer against a fixed schema.
//!
//! # Usage
//!
//! ```bash
//! # Tag a single sentence
//! udpos tag "The quick brown fox jumps over the lazy dog."
//!
//! # Tag a file (one sentence per line) in paced batches
//! udpos tag --input sentences.txt --provider grok --format jsonl --output tagged.jsonl
//!
//! # Show the tagset
//! udpos tagset
//!
//! # View configuration
//! udpos config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// udpos - Universal Dependencies POS tagging via LLM structured output.
#[derive(Parser, Debug)]
#[command(name = "udpos")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tag text with Universal Dependencies POS tags
    Tag(cli::tag::TagArgs),

    /// List the 17 UD part-of-speech tags
    Tagset(cli::tagset::TagsetArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match udpos_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `udpos config path`."
            );
            udpos_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("udpos v{}", udpos_core::VERSION);

    match cli.command {
        Commands::Tag(args) => cli::tag::execute(args, config).await,
        Commands::Tagset(args) => cli::tagset::execute(args),
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
