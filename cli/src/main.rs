//! repoqa - semantic code search over embedded source chunks.

mod ask;
mod cli;
mod embed;
mod index;
mod query;
mod settings;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up OPENAI_API_KEY and REPOQA_* from a local .env before clap reads env.
    let _ = dotenvy::dotenv();

    // Logs go to stderr so `query --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("REPOQA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        // Chunking needs no credentials.
        Command::Index { path, chunks } => index::run(path, chunks),
        Command::Embed { chunks } => {
            let config = settings::load_embedder_config(&cli)?;
            embed::run(&config, chunks, &cli.index).await
        }
        Command::Query { query, top, json } => {
            let config = settings::load_embedder_config(&cli)?;
            query::run(&config, &cli.index, query, *top, *json).await
        }
        Command::Ask {
            question,
            top,
            model,
            timeout,
        } => {
            let config = settings::load_embedder_config(&cli)?;
            let question = question.join(" ");
            let timeout = Duration::from_secs(*timeout);
            ask::run(&config, &cli.index, &question, *top, model, timeout).await
        }
    }
}
