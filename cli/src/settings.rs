//! Builds the embedder configuration once at startup.

use anyhow::{Context, Result};
use repoqa_embeddings::EmbedderConfig;
use tracing::debug;

use crate::cli::Cli;

/// Defaults, then the optional TOML file, then command line overrides, then
/// the credential from the environment. A missing credential is fatal.
pub fn load_embedder_config(cli: &Cli) -> Result<EmbedderConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EmbedderConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EmbedderConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }

    config.load_api_key_from_env()?;
    config.validate()?;

    debug!(?config, "Loaded embedder configuration");
    Ok(config)
}
