//! Error types for the embeddings system.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No credential available for the embedding API.
    #[error("{0} environment variable not set")]
    MissingCredential(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The API answered with a non-success status.
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Well-formed response without any embedding in it.
    #[error("no embedding returned")]
    EmptyResponse,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An embedding component is NaN or infinite.
    #[error("non-finite embedding component at index {index}")]
    NonFiniteComponent { index: usize },

    /// Similarity over vectors holding NaN or infinite values.
    #[error("similarity is not finite")]
    NonFiniteScore,

    /// Chunk source could not be read.
    #[error("failed to read chunks from {path}: {source}")]
    ChunkIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Index file could not be opened, written or replaced.
    #[error("index io error at {path}: {source}")]
    IndexIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Index file is not a well-formed index.
    #[error("failed to parse index {path}: {source}")]
    IndexParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A stored record violates the index invariants.
    #[error("invalid record {id} in index {path}: {source}")]
    InvalidRecord {
        path: PathBuf,
        id: String,
        source: Box<EmbeddingError>,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
