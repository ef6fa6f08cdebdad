use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use repoqa_chunker::{chunk_tree, write_jsonl};
use tracing::info;

/// Chunk the source tree at `root` into `chunks_path`.
pub fn run(root: &Path, chunks_path: &Path) -> Result<()> {
    let started = Instant::now();

    let report = chunk_tree(root)
        .with_context(|| format!("failed to index {}", root.display()))?;
    write_jsonl(&report.chunks, chunks_path).context("failed to write chunks")?;

    println!(
        "Wrote {} chunks from {} files to {}",
        report.chunks.len(),
        report.files,
        chunks_path.display()
    );
    info!(
        failed = report.failed,
        "Indexed in {}ms",
        started.elapsed().as_millis()
    );
    Ok(())
}
