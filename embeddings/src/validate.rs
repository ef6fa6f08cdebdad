//! Sanity checks for produced embeddings.

use crate::chunk::EmbeddedChunk;
use crate::error::{EmbeddingError, Result};

/// Accepts or rejects embeddings for an index of a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    dimension: usize,
}

impl Validator {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return the reason `embedding` would be rejected, if any.
    pub fn check(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        if let Some(index) = embedding.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFiniteComponent { index });
        }

        Ok(())
    }

    pub fn is_valid(&self, chunk: &EmbeddedChunk) -> bool {
        self.check(&chunk.embedding).is_ok()
    }
}
