//! Chunk records flowing through the pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// One unit of source code plus its location, as produced by the chunker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub id: String,

    /// Path of the file the code was taken from.
    #[serde(default)]
    pub file: String,

    #[serde(default)]
    pub code: String,
}

impl Chunk {
    pub fn new(id: impl Into<String>, file: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            code: code.into(),
        }
    }

    /// A chunk is usable only when it names a file and carries code.
    pub fn is_complete(&self) -> bool {
        !self.file.is_empty() && !self.code.is_empty()
    }

    /// Attach an embedding, producing the persisted record.
    pub fn with_embedding(self, embedding: Embedding) -> EmbeddedChunk {
        EmbeddedChunk {
            id: self.id,
            file: self.file,
            code: self.code,
            embedding,
        }
    }
}

/// A chunk together with its validated embedding.
///
/// The persisted key names are capitalized to stay readable by existing
/// index files; lowercase keys are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,

    #[serde(rename = "File", alias = "file")]
    pub file: String,

    #[serde(rename = "Code", alias = "code")]
    pub code: String,

    #[serde(rename = "Embedding", alias = "embedding")]
    pub embedding: Embedding,
}

/// A stored chunk scored against a query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub file: String,
    pub code: String,
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: &EmbeddedChunk, score: f32) -> Self {
        Self {
            id: chunk.id.clone(),
            file: chunk.file.clone(),
            code: chunk.code.clone(),
            score,
        }
    }
}

/// Read newline-delimited JSON chunks from `path`.
///
/// Blank, malformed and incomplete lines are skipped with a warning. Only
/// failing to open or read the file is an error.
pub fn read_chunks(path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
    let path = path.as_ref();
    let io_err = |source| EmbeddingError::ChunkIo {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut chunks = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: Chunk = match serde_json::from_str(&line) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(line = line_no + 1, "Skipping invalid line: {e}");
                continue;
            }
        };

        if !chunk.is_complete() {
            warn!(
                line = line_no + 1,
                chunk_id = %chunk.id,
                "Skipping incomplete chunk"
            );
            continue;
        }

        chunks.push(chunk);
    }

    info!("Parsed {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_read_chunks_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"chunk_0","file":"src/a.go","code":"func A() {{}}"}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"chunk_1","file":"","code":"x"}}"#).unwrap();
        writeln!(file, r#"{{"id":"chunk_2","file":"src/b.go"}}"#).unwrap();
        writeln!(
            file,
            r#"{{"id":"chunk_3","file":"src/c.ts","code":"class C {{}}","symbol":"C","startLine":1}}"#
        )
        .unwrap();

        let chunks = read_chunks(file.path()).unwrap();

        assert_eq!(
            chunks,
            vec![
                Chunk::new("chunk_0", "src/a.go", "func A() {}"),
                Chunk::new("chunk_3", "src/c.ts", "class C {}"),
            ]
        );
    }

    #[test]
    fn test_read_chunks_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_chunks(dir.path().join("missing.jsonl"));
        assert!(matches!(result, Err(EmbeddingError::ChunkIo { .. })));
    }

    #[test]
    fn test_embedded_chunk_accepts_both_key_styles() {
        let upper: EmbeddedChunk =
            serde_json::from_str(r#"{"ID":"a","File":"f","Code":"c","Embedding":[1.0]}"#).unwrap();
        let lower: EmbeddedChunk =
            serde_json::from_str(r#"{"id":"a","file":"f","code":"c","embedding":[1.0]}"#).unwrap();
        assert_eq!(upper, lower);

        let json = serde_json::to_value(&upper).unwrap();
        assert_eq!(json["ID"], "a");
        assert_eq!(json["Embedding"][0], 1.0);
    }
}
