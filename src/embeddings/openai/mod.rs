
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::composer::Generator;
use crate::config::Config;
use crate::embeddings::{Embedder, EmbeddingVector};
use crate::{QaError, Result};

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for an OpenAI-compatible embeddings + chat completions API.
///
/// Embedding calls are retried with exponential backoff on rate limits and
/// transient failures; completion calls are issued once and surface
/// [`QaError::Generation`] on failure, retry policy being a caller concern.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    completion_model: String,
    batch_size: u32,
    http: reqwest::Client,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &Config, api_key: String) -> Result<Self> {
        let base_url = config
            .openai_url()
            .map_err(|e| QaError::InvalidConfiguration(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_seconds))
            .build()
            .map_err(|e| QaError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.openai.embedding_model.clone(),
            completion_model: config.openai.completion_model.clone(),
            batch_size: config.openai.batch_size,
            http,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Probe the service with the configured credential.
    ///
    /// A rejected credential surfaces as [`QaError::Authentication`]; callers
    /// must treat that as fatal and issue no further calls.
    #[inline]
    pub async fn validate_key(&self) -> Result<()> {
        let url = self.endpoint("/v1/models")?;
        debug!("Validating API key against {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(QaError::Authentication(
                "API key was rejected by the model service".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(QaError::TransientService(format!(
                "key validation returned HTTP {}",
                status
            )));
        }

        debug!("API key validated");
        Ok(())
    }

    /// Generate one chat completion for the prompt at the given temperature.
    #[inline]
    pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.completion_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature,
        };

        let response: ChatCompletionResponse = self
            .request_json("/v1/chat/completions", &request, |message| {
                QaError::Generation(message)
            })
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| QaError::Generation("completion response had no choices".to_string()))?;

        Ok(choice.message.content)
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        let request = EmbeddingsRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response: EmbeddingsResponse = self
            .request_with_retry("/v1/embeddings", &request)
            .await?;

        if response.data.len() != texts.len() {
            return Err(QaError::TransientService(format!(
                "embedding count mismatch: requested {}, received {}",
                texts.len(),
                response.data.len()
            )));
        }

        // The API may return entries out of order; the index field is authoritative.
        let mut data = response.data;
        data.sort_by_key(|entry| entry.index);

        Ok(data.into_iter().map(|entry| entry.embedding).collect())
    }

    async fn request_with_retry<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut last_error = QaError::TransientService("request was never attempted".to_string());

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match self
                .request_json(path, body, |message| QaError::TransientService(message))
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) if error.is_retryable() => {
                    warn!(
                        "Retryable failure on attempt {}/{}: {}",
                        attempt, self.retry_attempts, error
                    );
                    last_error = error;

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error)
    }

    async fn request_json<B, R>(
        &self,
        path: &str,
        body: &B,
        on_failure: impl Fn(String) -> QaError,
    ) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    transport_error(e)
                } else {
                    on_failure(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(QaError::Authentication(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QaError::RateLimited(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }

        if status.is_server_error() {
            return Err(QaError::TransientService(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(on_failure(format!(
                "{} returned HTTP {}: {}",
                path, status, detail
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| on_failure(format!("failed to parse {} response: {}", path, e)))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| QaError::InvalidConfiguration(format!("bad endpoint {}: {}", path, e)))
    }
}

fn transport_error(error: reqwest::Error) -> QaError {
    if error.is_timeout() {
        QaError::TransientService(format!("request timed out: {}", error))
    } else {
        QaError::TransientService(format!("transport error: {}", error))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            let batch_vectors = self.embed_single_batch(batch).await?;
            vectors.extend(batch_vectors);
        }

        debug!("Generated {} embeddings", vectors.len());
        Ok(vectors)
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        OpenAiClient::complete(self, prompt, temperature).await
    }
}
