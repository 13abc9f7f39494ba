//! Tagger setup: config overrides and provider creation.

use udpos_core::{BatchOptions, BatchTagger, Config, LlmProviderFactory, Tagger, TaggerOptions};

use super::TagArgs;

/// Apply CLI overrides on top of the loaded config and validate the result.
pub fn apply_overrides(mut config: Config, args: &TagArgs) -> anyhow::Result<Config> {
    if let Some(provider) = args.provider {
        config.tagging.provider = provider.to_string();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.tagging.timeout_ms = timeout_ms;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch.batch_size = batch_size;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.batch.inter_batch_delay_ms = delay_ms;
    }
    if let Some(retries) = args.retries {
        config.batch.retry_attempts = retries;
    }
    config.validate()?;
    Ok(config)
}

/// Build the batch tagger for the configured provider.
pub fn setup_tagger(config: &Config, args: &TagArgs) -> anyhow::Result<BatchTagger> {
    let options = TaggerOptions::from(&config.tagging);
    let provider = LlmProviderFactory::create(
        &config.tagging.provider,
        &config.llm,
        args.model.as_deref(),
        options.timeout,
    )?;

    tracing::info!(
        "Using {} ({}), batch size {}, {}ms between batches",
        provider.name(),
        provider.model(),
        config.batch.batch_size,
        config.batch.inter_batch_delay_ms
    );

    let tagger = Tagger::new(provider, options);
    Ok(BatchTagger::new(tagger, BatchOptions::from(&config.batch)))
}
