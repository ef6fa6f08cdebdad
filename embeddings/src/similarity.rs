//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;

use crate::chunk::{EmbeddedChunk, ScoredChunk};
use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors, or either vector is all zeros
/// - -1.0 means opposite vectors
///
/// NaN or infinite components make the score undefined and are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    // Accumulate in f64; 1536 products in f32 drift visibly.
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if !(dot.is_finite() && norm_a.is_finite() && norm_b.is_finite()) {
        return Err(EmbeddingError::NonFiniteScore);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(score.clamp(-1.0, 1.0) as f32)
}

/// Score every stored chunk against `query` and keep the best `k`.
///
/// Results are ordered by descending score. Equal scores keep the order the
/// chunks have in `chunks`. Fewer than `k` chunks is not an error.
pub fn rank(query: &[f32], chunks: &[EmbeddedChunk], k: usize) -> Result<Vec<ScoredChunk>> {
    let mut scored: Vec<(OrderedFloat<f32>, usize)> = Vec::with_capacity(chunks.len());

    for (position, chunk) in chunks.iter().enumerate() {
        let score = cosine_similarity(query, &chunk.embedding)?;
        scored.push((OrderedFloat(score), position));
    }

    // Stable, so ties stay in insertion order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(score, position)| ScoredChunk::new(&chunks[position], score.0))
        .collect())
}
