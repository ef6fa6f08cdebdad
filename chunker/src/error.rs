//! Error types for source chunking.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while chunking a source tree.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// A source file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The chunk file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No grammar is registered for the file's extension.
    #[error("unsupported source file: {0}")]
    Unsupported(PathBuf),

    /// Tree-sitter refused the grammar.
    #[error("failed to load {language} grammar: {message}")]
    Grammar {
        language: &'static str,
        message: String,
    },

    /// Tree-sitter produced no tree.
    #[error("failed to parse {0}")]
    Parse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
