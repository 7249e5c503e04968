// Fixed-window character chunker
// Windows advance by chunk_size - overlap so adjacent segments share context


use tracing::debug;

use crate::config::ChunkingConfig;
use crate::loader::Document;
use crate::{QaError, Result};

/// A contiguous slice of document text, the unit of retrieval.
///
/// `start`/`end` are character offsets into the source document; adjacent
/// segments overlap by the configured number of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub source: String,
}

impl Segment {
    /// Length in characters.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split a document into overlapping fixed-size segments in document order.
///
/// Deterministic: the same document and config always produce the same
/// sequence. The final segment may be shorter than `chunk_size`.
#[inline]
pub fn split_document(document: &Document, config: &ChunkingConfig) -> Result<Vec<Segment>> {
    if config.chunk_size == 0 {
        return Err(QaError::InvalidConfiguration(
            "chunk_size must be positive".to_string(),
        ));
    }

    if config.overlap >= config.chunk_size {
        return Err(QaError::InvalidConfiguration(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            config.overlap, config.chunk_size
        )));
    }

    // Character positions mapped to byte offsets, so windows are measured in
    // characters but slicing stays on UTF-8 boundaries.
    let char_offsets: Vec<usize> = document
        .text
        .char_indices()
        .map(|(byte_offset, _)| byte_offset)
        .collect();
    let total_chars = char_offsets.len();

    if total_chars == 0 {
        return Ok(Vec::new());
    }

    let step = config.chunk_size - config.overlap;
    let mut segments = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + config.chunk_size).min(total_chars);
        let byte_start = char_offsets[start];
        let byte_end = if end == total_chars {
            document.text.len()
        } else {
            char_offsets[end]
        };

        segments.push(Segment {
            id: segments.len(),
            text: document.text[byte_start..byte_end].to_string(),
            start,
            end,
            source: document.source_name.clone(),
        });

        if end == total_chars {
            break;
        }
        start += step;
    }

    debug!(
        "Split '{}' into {} segments (chunk_size={}, overlap={})",
        document.source_name,
        segments.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(segments)
}
