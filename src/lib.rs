use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited by model service: {0}")]
    RateLimited(String),

    #[error("Transient service failure: {0}")]
    TransientService(String),

    #[error("No document has been loaded")]
    EmptyIndex,

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl QaError {
    /// Stable machine-readable code, used by the HTTP error payload.
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            QaError::InvalidConfiguration(_) => "invalid_configuration",
            QaError::UnsupportedFormat(_) => "unsupported_format",
            QaError::MalformedInput(_) => "malformed_input",
            QaError::Authentication(_) => "authentication_failed",
            QaError::RateLimited(_) => "rate_limited",
            QaError::TransientService(_) => "transient_service_failure",
            QaError::EmptyIndex => "empty_index",
            QaError::Generation(_) => "generation_failed",
            QaError::Io(_) => "io_error",
            QaError::Other(_) => "internal_error",
        }
    }

    /// Whether a failed call is worth retrying with backoff.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, QaError::RateLimited(_) | QaError::TransientService(_))
    }
}

pub mod chunker;
pub mod commands;
pub mod composer;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod server;
