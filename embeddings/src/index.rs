//! Flat on-disk embedding index.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::chunk::{EmbeddedChunk, ScoredChunk};
use crate::error::{EmbeddingError, Result};
use crate::similarity::rank;
use crate::validate::Validator;

/// An ordered collection of embedded chunks, persisted as one JSON file.
///
/// Every write replaces the whole file; there is no append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingIndex {
    chunks: Vec<EmbeddedChunk>,
}

impl EmbeddingIndex {
    pub fn new(chunks: Vec<EmbeddedChunk>) -> Self {
        Self { chunks }
    }

    /// Load an index from `path`.
    ///
    /// Every record must hold only finite values and share the first
    /// record's dimensionality.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EmbeddingError::IndexIo {
            path: path.to_path_buf(),
            source,
        })?;

        let chunks: Vec<EmbeddedChunk> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| EmbeddingError::IndexParse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(first) = chunks.first() {
            let validator = Validator::new(first.embedding.len());
            for chunk in &chunks {
                validator
                    .check(&chunk.embedding)
                    .map_err(|e| EmbeddingError::InvalidRecord {
                        path: path.to_path_buf(),
                        id: chunk.id.clone(),
                        source: Box::new(e),
                    })?;
            }
        }

        info!("Loaded {} entries from {}", chunks.len(), path.display());
        Ok(Self { chunks })
    }

    /// Write the index to `path` as pretty-printed JSON.
    ///
    /// The content goes to a temporary file next to `path` which is then
    /// renamed over it, so readers never see a half-written index.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| EmbeddingError::IndexIo {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let tmp = temp_file_in(dir).map_err(io_err)?;
        encode(BufWriter::new(tmp.as_file()), &self.chunks, path)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        info!(
            "Wrote {} embedded chunks to {}",
            self.chunks.len(),
            path.display()
        );
        Ok(())
    }

    /// Rank all entries against `query` and return the best `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let results = rank(query, &self.chunks, k)?;
        debug!(
            "Scored {} chunks, returning top {}",
            self.chunks.len(),
            results.len()
        );
        Ok(results)
    }

    /// Length of the stored vectors, `None` for an empty index.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|chunk| chunk.embedding.len())
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<EmbeddedChunk> {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl From<Vec<EmbeddedChunk>> for EmbeddingIndex {
    fn from(chunks: Vec<EmbeddedChunk>) -> Self {
        Self::new(chunks)
    }
}

/// Temporary file created with the same mode a plain `File::create` gets.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn encode<W: Write>(mut writer: W, chunks: &[EmbeddedChunk], path: &Path) -> Result<()> {
    let io_err = |source| EmbeddingError::IndexIo {
        path: path.to_path_buf(),
        source,
    };

    serde_json::to_writer_pretty(&mut writer, chunks).map_err(|e| {
        if e.is_io() {
            io_err(io::Error::from(e))
        } else {
            EmbeddingError::Serialization(e)
        }
    })?;
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use pretty_assertions::assert_eq;

    fn sample() -> EmbeddingIndex {
        EmbeddingIndex::new(vec![
            Chunk::new("chunk_0", "src/a.go", "func A() {}")
                .with_embedding(vec![0.1, -0.000_123_45, 1.0e-7, 0.333_333_34]),
            Chunk::new("chunk_1", "src/b.ts", "class B {\n  run() {}\n}")
                .with_embedding(vec![-1.0, 0.5, 0.0, 12345.678]),
        ])
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".index.json");
        let index = sample();

        index.write(&path).unwrap();
        let loaded = EmbeddingIndex::read(&path).unwrap();

        assert_eq!(loaded, index);
        for (a, b) in loaded.chunks().iter().zip(index.chunks()) {
            let bits_a: Vec<u32> = a.embedding.iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u32> = b.embedding.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_write_is_pretty_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");

        sample().write(&path).unwrap();
        EmbeddingIndex::default().write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[]");
        assert!(EmbeddingIndex::read(&path).unwrap().is_empty());

        sample().write(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n  {\n    \"ID\": \"chunk_0\""));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EmbeddingIndex::read(dir.path().join("nope.json"));
        assert!(matches!(result, Err(EmbeddingError::IndexIo { .. })));
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{\"ID\": ").unwrap();
        let result = EmbeddingIndex::read(&path);
        assert!(matches!(result, Err(EmbeddingError::IndexParse { .. })));
    }

    #[test]
    fn test_read_rejects_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        // 1e39 overflows f32 and would load as infinity.
        std::fs::write(
            &path,
            r#"[
                {"ID": "bad", "File": "a.go", "Code": "func A() {}", "Embedding": [1e39, 0.0]},
                {"ID": "good", "File": "b.go", "Code": "func B() {}", "Embedding": [1.0, 0.0]}
            ]"#,
        )
        .unwrap();

        match EmbeddingIndex::read(&path) {
            Err(EmbeddingError::InvalidRecord { id, source, .. }) => {
                assert_eq!(id, "bad");
                assert!(matches!(
                    *source,
                    EmbeddingError::NonFiniteComponent { index: 0 }
                ));
            }
            other => panic!("expected invalid record, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rejects_mixed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(
            &path,
            r#"[
                {"ID": "a", "File": "a.go", "Code": "func A() {}", "Embedding": [1.0, 0.0]},
                {"ID": "b", "File": "b.go", "Code": "func B() {}", "Embedding": [1.0, 0.0, 0.0]}
            ]"#,
        )
        .unwrap();

        let err = EmbeddingIndex::read(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid record b in index {}: dimension mismatch: expected 2, got 3",
                path.display()
            )
        );
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_reports_index_path() {
        let path = Path::new("data/.index.json");
        let err = encode(FullDisk, sample().chunks(), path).unwrap_err();
        match err {
            EmbeddingError::IndexIo { path: failed, source } => {
                assert_eq!(failed, path);
                assert_eq!(source.to_string(), "no space left on device");
            }
            other => panic!("expected index io error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_written_index_is_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        sample().write(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o044, 0o044, "mode {mode:o}");
    }

    #[test]
    fn test_dimension() {
        assert_eq!(sample().dimension(), Some(4));
        assert_eq!(EmbeddingIndex::default().dimension(), None);
    }

    #[test]
    fn test_search_delegates_to_ranker() {
        let index = sample();
        let results = index.search(&[-1.0, 0.5, 0.0, 0.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "chunk_1");
    }
}
