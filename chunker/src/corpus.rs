//! Chunking a whole tree into newline-delimited JSON.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::{ChunkerError, Result};
use crate::extract::{Chunker, CodeChunk};
use crate::walk::source_files;

/// Outcome of chunking a tree.
#[derive(Debug, Clone, Default)]
pub struct ChunkReport {
    /// Chunks from every file, in path order.
    pub chunks: Vec<CodeChunk>,

    /// Source files chunked successfully.
    pub files: usize,

    /// Source files that could not be read or parsed.
    pub failed: usize,
}

/// Chunk every supported source file under `root`.
///
/// Files are reported relative to `root`. A file that fails to read or parse
/// is logged and left out.
pub fn chunk_tree(root: &Path) -> Result<ChunkReport> {
    info!("Indexing: {}", root.display());
    let mut chunker = Chunker::new();
    let mut report = ChunkReport::default();

    for path in source_files(root)? {
        let file = display_name(root, &path);
        match chunker.chunk_file(&path, &file) {
            Ok(chunks) => {
                report.files += 1;
                report.chunks.extend(chunks);
            }
            Err(e) => {
                warn!("Error processing {file}: {e}");
                report.failed += 1;
            }
        }
    }

    info!(
        files = report.files,
        failed = report.failed,
        "Extracted {} chunks",
        report.chunks.len()
    );
    Ok(report)
}

/// Write `chunks` to `path`, one JSON object per line, replacing the file.
pub fn write_jsonl(chunks: &[CodeChunk], path: &Path) -> Result<()> {
    let write_err = |source| ChunkerError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let tmp = temp_file_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        for chunk in chunks {
            serde_json::to_writer(&mut writer, chunk).map_err(|e| {
                if e.is_io() {
                    write_err(io::Error::from(e))
                } else {
                    ChunkerError::Serialization(e)
                }
            })?;
            writer.write_all(b"\n").map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// `path` relative to `root` with `/` separators, or `path` itself when it
/// is not below `root`.
fn display_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        return path.to_string_lossy().into_owned();
    }
    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
