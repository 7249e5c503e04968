use super::*;
use crate::embeddings::EmbeddingVector;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const DIM: usize = 32;

/// Deterministic bag-of-words embedder: each word hashes into one dimension.
struct KeywordEmbedder;

fn embed_text(text: &str) -> EmbeddingVector {
    let mut vector = vec![0.0f32; DIM];
    for word in text.to_lowercase().split_whitespace() {
        let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if word.is_empty() {
            continue;
        }
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        vector[(hasher.finish() % DIM as u64) as usize] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> crate::Result<Vec<EmbeddingVector>> {
        Ok(texts.iter().map(|text| embed_text(text)).collect())
    }
}

fn segment(id: usize, text: &str) -> Segment {
    Segment {
        id,
        text: text.to_string(),
        start: 0,
        end: text.chars().count(),
        source: "test.json".to_string(),
    }
}

async fn index_of(texts: &[&str]) -> VectorIndex {
    let segments: Vec<Segment> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| segment(i, text))
        .collect();
    let embedder = KeywordEmbedder;
    let vectors = embedder
        .embed_batch(&texts.iter().map(|t| (*t).to_string()).collect::<Vec<_>>())
        .await
        .expect("embedding should succeed");
    VectorIndex::build(segments, vectors).expect("build should succeed")
}

#[tokio::test]
async fn retrieves_most_relevant_segment_first() {
    let index = index_of(&[
        "The weather today is sunny and warm.",
        "The car involved was a red sedan.",
        "Pears are either red or orange.",
    ])
    .await;

    let retriever = Retriever::new(Arc::new(KeywordEmbedder));
    let segments = retriever
        .retrieve(&index, "What color was the car?", 2)
        .await
        .expect("retrieve should succeed");

    assert_eq!(segments.len(), 2);
    assert!(segments[0].text.contains("car"));
}

#[tokio::test]
async fn clamps_k_to_index_size() {
    let index = index_of(&["only one segment here"]).await;
    let retriever = Retriever::new(Arc::new(KeywordEmbedder));

    let segments = retriever
        .retrieve(&index, "anything", 10)
        .await
        .expect("retrieve should succeed");

    assert_eq!(segments.len(), 1);
}

#[tokio::test]
async fn empty_index_propagates_error() {
    let index = VectorIndex::build(Vec::new(), Vec::new()).expect("empty build is fine");
    let retriever = Retriever::new(Arc::new(KeywordEmbedder));

    let result = retriever.retrieve(&index, "anything", 3).await;
    assert!(matches!(result, Err(crate::QaError::EmptyIndex)));
}
