use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use repoqa_embeddings::{
    BatchScheduler, EmbedderConfig, EmbeddingIndex, OpenAIProvider, read_chunks,
};
use tracing::info;

/// Embed every chunk in `chunks_path` and replace the index at `index_path`.
pub async fn run(config: &EmbedderConfig, chunks_path: &Path, index_path: &Path) -> Result<()> {
    let started = Instant::now();

    let chunks = read_chunks(chunks_path)
        .with_context(|| format!("failed to open {}", chunks_path.display()))?;
    println!("Parsed {} chunks", chunks.len());

    let provider = Arc::new(OpenAIProvider::new(config)?);
    let scheduler = BatchScheduler::new(provider, config);
    let report = scheduler.run(chunks).await;
    let (kept, total) = (report.kept(), report.total);

    EmbeddingIndex::new(report.chunks)
        .write(index_path)
        .context("failed to write index")?;
    println!(
        "Wrote {kept} of {total} embedded chunks to {}",
        index_path.display()
    );

    let elapsed = started.elapsed();
    let rate = kept as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        failed = report.failed,
        invalid = report.invalid,
        "Completed in {}ms ({rate:.2} chunks/sec)",
        elapsed.as_millis()
    );
    Ok(())
}
