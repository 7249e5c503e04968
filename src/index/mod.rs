// In-memory vector index
// Brute-force cosine scan; exact top-k at the scale of one loaded document

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::chunker::Segment;
use crate::embeddings::EmbeddingVector;
use crate::{QaError, Result};

/// Owns the (segment, vector) pairs for one loaded document.
///
/// Built once per load and never mutated afterwards, so concurrent reads
/// need no synchronization.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    segments: Vec<Segment>,
    vectors: Vec<EmbeddingVector>,
    dimension: usize,
}

/// A retrieved segment with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub segment: Segment,
    pub score: f32,
}

impl VectorIndex {
    /// Build an index from matched (segment, vector) pairs.
    ///
    /// All vectors must share one dimension; mismatches indicate an embedder
    /// bug and are rejected.
    #[inline]
    pub fn build(segments: Vec<Segment>, vectors: Vec<EmbeddingVector>) -> Result<Self> {
        if segments.len() != vectors.len() {
            return Err(QaError::InvalidConfiguration(format!(
                "segment/vector count mismatch: {} vs {}",
                segments.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(QaError::InvalidConfiguration(format!(
                "vector {} has dimension {}, expected {}",
                bad,
                vectors[bad].len(),
                dimension
            )));
        }

        debug!(
            "Built vector index: {} segments, dimension {}",
            segments.len(),
            dimension
        );

        Ok(Self {
            segments,
            vectors,
            dimension,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return the `k` most similar segments by cosine similarity, in
    /// descending score order. `k` is clamped to the number of stored
    /// segments.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.segments.is_empty() {
            return Err(QaError::EmptyIndex);
        }

        if query.len() != self.dimension {
            return Err(QaError::InvalidConfiguration(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine_similarity(query, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(self.segments.len()));

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                segment: self.segments[i].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// Zero-norm inputs score 0.0 rather than NaN.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
