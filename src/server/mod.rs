// HTTP upload boundary
// One endpoint: two file uploads in, ordered {question, answer} records out

#[cfg(test)]
mod tests;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::loader::{read_question_batch, DocumentSource};
use crate::pipeline::{AnswerRecord, RagPipeline};
use crate::{QaError, Result};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Server state: one pipeline instance scoped to this server's lifecycle.
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub config: Config,
}

/// Structured error payload returned by the HTTP boundary.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub code: &'static str,
}

#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(answer_questions))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
#[inline]
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let address = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {}", address);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn answer_questions(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    match handle_upload(&state, multipart).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => {
            error!("Request failed: {}", err);
            error_response(&err)
        }
    }
}

async fn handle_upload(state: &AppState, multipart: Multipart) -> Result<Vec<AnswerRecord>> {
    // Each request stages into its own directory so concurrent uploads cannot
    // collide, and the whole thing is removed once the request is done.
    let request_dir = state.config.staging_dir().join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&request_dir).await?;

    let result = stage_and_answer(state, multipart, &request_dir).await;

    if let Err(err) = tokio::fs::remove_dir_all(&request_dir).await {
        warn!(
            "Failed to remove staging dir {}: {}",
            request_dir.display(),
            err
        );
    }

    result
}

async fn stage_and_answer(
    state: &AppState,
    mut multipart: Multipart,
    request_dir: &Path,
) -> Result<Vec<AnswerRecord>> {
    let mut questions_path: Option<PathBuf> = None;
    let mut context_path: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| QaError::MalformedInput(format!("invalid multipart payload: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| QaError::MalformedInput(format!("field '{}' has no file name", name)))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| QaError::MalformedInput(format!("failed to read '{}': {}", name, e)))?;

        // Keep only the final path component of the client-supplied name.
        let staged_name = Path::new(&file_name).file_name().ok_or_else(|| {
            QaError::MalformedInput(format!("field '{}' has an invalid file name", name))
        })?;
        let staged = request_dir.join(staged_name);
        tokio::fs::write(&staged, &bytes).await?;

        match name.as_str() {
            "questions_file" => questions_path = Some(staged),
            "context_file" => context_path = Some(staged),
            _ => {
                return Err(QaError::MalformedInput(format!(
                    "unexpected multipart field '{}'",
                    name
                )));
            }
        }
    }

    let questions_path = questions_path
        .ok_or_else(|| QaError::MalformedInput("missing 'questions_file' upload".to_string()))?;
    let context_path = context_path
        .ok_or_else(|| QaError::MalformedInput("missing 'context_file' upload".to_string()))?;

    let questions_is_json = questions_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !questions_is_json {
        return Err(QaError::UnsupportedFormat(
            "questions file must be in json format".to_string(),
        ));
    }

    let questions = read_question_batch(&questions_path)?;
    let document = DocumentSource::from_path(&context_path)?.load()?;

    state.pipeline.load(&document).await?;

    let retrieval = state.config.retrieval;
    let records = state
        .pipeline
        .answer_batch(
            &questions,
            retrieval.top_k,
            retrieval.temperature,
            retrieval.max_concurrency,
        )
        .await?;

    // The artifact is an audit side effect; the response is authoritative.
    if let Err(err) = write_output_artifact(state, &records).await {
        warn!("Failed to write answers artifact: {}", err);
    }

    Ok(records)
}

/// Write the ordered result array to answers.json for audit/inspection.
async fn write_output_artifact(state: &AppState, records: &[AnswerRecord]) -> Result<()> {
    let output_dir = state.config.output_dir();
    tokio::fs::create_dir_all(&output_dir).await?;

    let path = output_dir.join("answers.json");
    let content = serde_json::to_string_pretty(records)
        .map_err(|e| QaError::MalformedInput(format!("failed to serialize answers: {}", e)))?;
    tokio::fs::write(&path, content).await?;

    info!("Wrote {} answers to {}", records.len(), path.display());
    Ok(())
}

fn error_response(error: &QaError) -> Response {
    let status = match error {
        QaError::InvalidConfiguration(_)
        | QaError::UnsupportedFormat(_)
        | QaError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        QaError::Authentication(_) => StatusCode::UNAUTHORIZED,
        QaError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        QaError::TransientService(_) => StatusCode::SERVICE_UNAVAILABLE,
        QaError::EmptyIndex
        | QaError::Generation(_)
        | QaError::Io(_)
        | QaError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = ErrorPayload {
        error: error.to_string(),
        code: error.code(),
    };

    (status, Json(payload)).into_response()
}
