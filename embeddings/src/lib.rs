//! # Embeddings
//!
//! This crate turns source-code chunks into embeddings through a remote
//! embedding API, persists them as a flat index, and ranks the index against
//! an embedded query.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors with retry and backoff
//! - **Batch Scheduling**: Embed many chunks under a concurrency cap, tolerating partial failure
//! - **Validation**: Drop embeddings with the wrong dimension or non-finite values
//! - **Similarity Search**: Exhaustive cosine ranking with a stable top-K
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Chunk ──► BatchScheduler ──► EmbeddingProvider ──► Validator   │
//! │                                                        │        │
//! │                                                        ▼        │
//! │  query ──► EmbeddingProvider ──► EmbeddingIndex ◄── index.json  │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                                  ScoredChunk (top-K)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod index;
pub mod provider;
pub mod scheduler;
pub mod similarity;
pub mod validate;

pub use chunk::{Chunk, EmbeddedChunk, ScoredChunk, read_chunks};
pub use config::EmbedderConfig;
pub use error::{EmbeddingError, Result};
pub use index::EmbeddingIndex;
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use scheduler::{BatchReport, BatchScheduler};
pub use similarity::{cosine_similarity, rank};
pub use validate::Validator;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default model.
pub const DEFAULT_DIMENSION: usize = 1536; // text-embedding-ada-002
