use std::fmt::Write as _;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use repoqa_embeddings::{
    EmbedderConfig, EmbeddingIndex, EmbeddingProvider, OpenAIProvider, ScoredChunk, Validator,
};
use tracing::info;

/// Embed `query` and rank it against the index at `index_path`.
pub async fn search(
    config: &EmbedderConfig,
    index_path: &Path,
    query: &str,
    top: usize,
) -> Result<Vec<ScoredChunk>> {
    if query.trim().is_empty() {
        bail!("query string required.\nUsage: repoqa query \"your question\" --top 5");
    }

    let index = EmbeddingIndex::read(index_path).context("failed to load index")?;

    let provider = OpenAIProvider::new(config)?;
    let query_embedding = provider
        .embed(query)
        .await
        .context("failed to embed query")?;
    if let Some(dimension) = index.dimension() {
        Validator::new(dimension)
            .check(&query_embedding)
            .context("invalid query embedding")?;
    }

    let results = index
        .search(&query_embedding, top)
        .context("search failed")?;
    info!(
        "Scored {} chunks, returning top {}",
        index.len(),
        results.len()
    );
    Ok(results)
}

pub async fn run(
    config: &EmbedderConfig,
    index_path: &Path,
    query: &str,
    top: usize,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let results = search(config, index_path, query, top).await?;
    info!("Query completed in {}ms", started.elapsed().as_millis());

    if json {
        println!(
            "{}",
            serde_json::to_string(&results).context("failed to encode results")?
        );
        return Ok(());
    }

    print!("{}", render_matches(&results));
    Ok(())
}

/// Render matches as markdown sections with fenced code.
pub fn render_matches(results: &[ScoredChunk]) -> String {
    if results.is_empty() {
        return "No matching chunks in the index.\n".to_string();
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "### Match #{} — Score: {:.4}", i + 1, result.score);
        let _ = writeln!(out, "File: {}\n", result.file);
        let _ = writeln!(out, "```{}", fence_language(&result.file));
        let _ = writeln!(out, "{}", result.code);
        let _ = writeln!(out, "```\n");
    }
    out
}

fn fence_language(file: &str) -> &'static str {
    let extension = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    match extension {
        "go" => "go",
        "ts" | "tsx" => "ts",
        "js" | "jsx" | "mjs" | "cjs" => "js",
        "py" => "python",
        "rs" => "rust",
        _ => "",
    }
}
