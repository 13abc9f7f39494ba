//! The `udpos config` command for configuration management.

use clap::{Args, Subcommand};
use udpos_core::{Config, LlmProviderFactory, PROVIDERS};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Report which providers have usable credentials
    Providers,
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Providers => {
            let config = Config::load()?;
            let timeout = std::time::Duration::from_millis(config.tagging.timeout_ms);
            for name in PROVIDERS {
                let marker = if name == config.tagging.provider { "*" } else { " " };
                match LlmProviderFactory::create(name, &config.llm, None, timeout) {
                    Ok(provider) => {
                        let status = status_label(name, provider.is_available().await);
                        println!("{marker} {name:<10} {:<32} {status}", provider.model());
                    }
                    Err(e) => println!("{marker} {name:<10} {:<32} {e}", "-"),
                }
            }
        }
    }

    Ok(())
}

/// Cloud providers only report whether a key is set; Ollama is probed.
fn status_label(provider: &str, available: bool) -> &'static str {
    match (provider, available) {
        ("ollama", true) => "reachable",
        ("ollama", false) => "unreachable",
        (_, true) => "configured",
        (_, false) => "missing key",
    }
}
