// Grounded answer composition
// Few-shot prompt biases the model toward the sentinel instead of guessing


use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::chunker::Segment;
use crate::Result;

/// Canonical reply when the retrieved context does not contain the answer.
pub const UNKNOWN_ANSWER: &str = "Sorry, I don't know about it.";

/// Text-generation capability behind the composer.
///
/// Failures surface as [`crate::QaError::Generation`] and are not retried
/// here; retry policy belongs to the caller.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the prompt. Temperature 0 is deterministic;
    /// higher values are more varied.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Builds a grounded prompt from retrieved segments and invokes the
/// generation capability.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
}

impl AnswerComposer {
    #[inline]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Compose an answer to the question from the retrieved segments.
    ///
    /// The raw model output is normalized to a single line: carriage returns
    /// and newlines are stripped so the answer embeds cleanly in JSON records.
    #[inline]
    pub async fn compose(
        &self,
        question: &str,
        segments: &[Segment],
        temperature: f32,
    ) -> Result<String> {
        let prompt = build_prompt(question, segments);
        debug!(
            "Composing answer from {} segments ({} prompt chars)",
            segments.len(),
            prompt.len()
        );

        let raw = self.generator.complete(&prompt, temperature).await?;
        Ok(normalize_answer(&raw))
    }
}

/// Grounded prompt: context-only instruction, the fixed unknown sentinel,
/// and two worked examples (one grounded, one sentinel).
#[inline]
pub fn build_prompt(question: &str, segments: &[Segment]) -> String {
    let context = segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end.\n\
         If you don't know the answer, just say that you don't know. Don't try to make up an answer.\n\
         Always remember to give only the answer of questions whose data you can find in the \"Context:\".\n\
         If you can't find the relevant information in \"Context:\" please return \"{UNKNOWN_ANSWER}\"\n\
         \n\
         Examples of some expected answers -\n\
         \n\
         Example #1\n\
         Context: The witness took the stand as directed. It was night and the witness forgot his glasses. \
         He was not sure if it was a sports car or an suv. The rest of the report shows everything was okay.\n\
         \n\
         Question: what type was the car?\n\
         Answer: He was not sure if it was a sports car or an suv.\n\
         \n\
         Example #2\n\
         Context: Pears are either red or orange\n\
         \n\
         Question: What are your network security protocols?\n\
         Answer: {UNKNOWN_ANSWER}\n\
         \n\
         Now your turn, Begin!\n\
         \n\
         Context: {context}\n\
         Question: {question}\n\
         Answer:"
    )
}

fn normalize_answer(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}
