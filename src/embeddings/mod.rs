// Embeddings module
// Trait seam for the external embedding service plus the OpenAI-compatible client

pub mod openai;

use async_trait::async_trait;

use crate::Result;

pub use openai::OpenAiClient;

/// Fixed-dimension vector representation of a piece of text.
pub type EmbeddingVector = Vec<f32>;

/// Maps text to fixed-dimension vectors.
///
/// All vectors produced by one instance have the same dimension; the index
/// similarity math depends on it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::QaError::TransientService("empty embedding response".to_string()))
    }
}
