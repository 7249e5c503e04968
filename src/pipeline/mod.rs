// Pipeline orchestration
// Load: chunk -> embed -> build index -> atomic swap. Query: retrieve -> compose.


use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::chunker::split_document;
use crate::composer::{AnswerComposer, Generator};
use crate::config::ChunkingConfig;
use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::loader::Document;
use crate::retriever::Retriever;
use crate::{QaError, Result};

/// One entry in a batch result: a grounded answer, or the error that kept
/// this question from being answered while the rest of the batch continued.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerRecord {
    #[inline]
    pub fn answered(question: String, answer: String) -> Self {
        Self {
            question,
            answer: Some(answer),
            error: None,
        }
    }

    #[inline]
    pub fn failed(question: String, error: &QaError) -> Self {
        Self {
            question,
            answer: None,
            error: Some(error.to_string()),
        }
    }
}

/// Summary of one load, for logging and status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub segments: usize,
    pub dimension: usize,
}

/// Orchestrates chunking, embedding, indexing and answering for one document
/// context at a time.
///
/// The index is an immutable value behind an `RwLock`; `load` builds a
/// complete replacement and swaps it in, so readers never observe a partially
/// built index. A separate mutex serializes concurrent loads.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    composer: AnswerComposer,
    chunking: ChunkingConfig,
    index: RwLock<Option<Arc<VectorIndex>>>,
    load_lock: Mutex<()>,
}

impl RagPipeline {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            embedder: Arc::clone(&embedder),
            retriever: Retriever::new(embedder),
            composer: AnswerComposer::new(generator),
            chunking,
            index: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Whether a document has been loaded.
    #[inline]
    pub async fn is_loaded(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Chunk and embed the document, then replace the current index.
    ///
    /// A second load fully replaces the prior index; documents are never
    /// merged across loads.
    #[inline]
    pub async fn load(&self, document: &Document) -> Result<LoadStats> {
        let _guard = self.load_lock.lock().await;

        let segments = split_document(document, &self.chunking)?;
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let index = VectorIndex::build(segments, vectors)?;

        let stats = LoadStats {
            segments: index.len(),
            dimension: index.dimension(),
        };

        *self.index.write().await = Some(Arc::new(index));

        info!(
            "Loaded '{}': {} segments, dimension {}",
            document.source_name, stats.segments, stats.dimension
        );
        Ok(stats)
    }

    /// Answer one question from the loaded document.
    #[inline]
    pub async fn answer(&self, question: &str, k: usize, temperature: f32) -> Result<String> {
        let index = self.snapshot().await?;
        self.answer_against(&index, question, k, temperature).await
    }

    async fn answer_against(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
        temperature: f32,
    ) -> Result<String> {
        let segments = self.retriever.retrieve(index, question, k).await?;
        self.composer.compose(question, &segments, temperature).await
    }

    /// Answer a batch of questions with bounded concurrent fan-out.
    ///
    /// Results come back in input order. A service-level failure on one
    /// question (generation, rate limit, transient outage) is recorded on
    /// that question's entry and the batch continues; an authentication
    /// failure or a missing index aborts the whole batch.
    ///
    /// The whole batch answers against one index snapshot, so a reload that
    /// lands mid-batch cannot mix two documents in one result array.
    #[inline]
    pub async fn answer_batch(
        &self,
        questions: &[String],
        k: usize,
        temperature: f32,
        max_concurrency: usize,
    ) -> Result<Vec<AnswerRecord>> {
        let index = self.snapshot().await?;

        let records = stream::iter(questions.iter().cloned())
            .map(|question| {
                let index = Arc::clone(&index);
                async move {
                    match self
                        .answer_against(&index, &question, k, temperature)
                        .await
                    {
                        Ok(answer) => Ok(AnswerRecord::answered(question, answer)),
                        Err(
                            error @ (QaError::Generation(_)
                            | QaError::RateLimited(_)
                            | QaError::TransientService(_)),
                        ) => {
                            warn!("Question failed, continuing batch: {}", error);
                            Ok(AnswerRecord::failed(question, &error))
                        }
                        Err(error) => Err(error),
                    }
                }
            })
            .buffered(max_concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        info!(
            "Answered batch of {} questions ({} errors)",
            records.len(),
            records.iter().filter(|r| r.error.is_some()).count()
        );
        Ok(records)
    }

    async fn snapshot(&self) -> Result<Arc<VectorIndex>> {
        self.index
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(QaError::EmptyIndex)
    }
}
