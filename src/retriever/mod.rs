// Retrieval step: embed the question, rank stored segments by similarity

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::debug;

use crate::chunker::Segment;
use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::Result;

/// Retrieves the segments most relevant to a question.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Return the `k` segments most similar to the question, best first.
    /// Scores are dropped; callers only need the ranked context.
    #[inline]
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<Segment>> {
        let query_vector = self.embedder.embed(question).await?;
        let results = index.search(&query_vector, k)?;

        debug!(
            "Retrieved {} segments for question ({} chars)",
            results.len(),
            question.len()
        );

        Ok(results.into_iter().map(|result| result.segment).collect())
    }
}
