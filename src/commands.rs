use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::embeddings::OpenAiClient;
use crate::loader::{read_question_batch, DocumentSource};
use crate::pipeline::RagPipeline;
use crate::server::{serve, AppState};

/// Build a pipeline backed by the OpenAI-compatible service, validating the
/// credential once up front. A rejected key blocks everything that follows.
#[inline]
pub async fn build_pipeline(config: &Config) -> Result<Arc<RagPipeline>> {
    let api_key = config.api_key().context("API key is not configured")?;

    let client = OpenAiClient::new(config, api_key).context("Failed to build service client")?;
    client
        .validate_key()
        .await
        .context("API key validation failed")?;

    let client = Arc::new(client);
    let embedder: Arc<dyn crate::embeddings::Embedder> = client.clone();
    let generator: Arc<dyn crate::composer::Generator> = client;

    Ok(Arc::new(RagPipeline::new(
        embedder,
        generator,
        config.chunking,
    )))
}

/// Start the HTTP boundary with one pipeline scoped to the server lifecycle.
#[inline]
pub async fn serve_http(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let pipeline = build_pipeline(&config).await?;
    let state = Arc::new(AppState { pipeline, config });

    serve(state).await.context("HTTP server failed")?;
    Ok(())
}

/// Answer a question batch against a context file, without the HTTP layer.
#[inline]
pub async fn answer_batch_files(
    config: &Config,
    questions_path: &Path,
    context_path: &Path,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let questions =
        read_question_batch(questions_path).context("Failed to read questions file")?;
    let document = DocumentSource::from_path(context_path)
        .context("Unsupported context file")?
        .load()
        .context("Failed to load context file")?;

    let pipeline = build_pipeline(config).await?;

    let stats = pipeline
        .load(&document)
        .await
        .context("Failed to index context document")?;
    info!(
        "Indexed {} segments (dimension {})",
        stats.segments, stats.dimension
    );

    let retrieval = config.retrieval;
    let records = pipeline
        .answer_batch(
            &questions,
            retrieval.top_k,
            retrieval.temperature,
            retrieval.max_concurrency,
        )
        .await
        .context("Failed to answer question batch")?;

    let serialized =
        serde_json::to_string_pretty(&records).context("Failed to serialize answers")?;

    match output_path {
        Some(path) => {
            std::fs::write(&path, &serialized)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} answers to {}",
                records.len(),
                path.display()
            );
        }
        None => println!("{serialized}"),
    }

    let failed = records.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        eprintln!("{failed} of {} questions failed; see the error entries", records.len());
    }

    Ok(())
}

/// Print the effective configuration, or write a default config file.
#[inline]
pub fn show_or_init_config(config: &Config, show: bool) -> Result<()> {
    if show {
        let rendered =
            toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("# {}", config.config_file_path().display());
        print!("{rendered}");
    } else {
        config.save().context("Failed to write configuration file")?;
        println!("Wrote {}", config.config_file_path().display());
    }
    Ok(())
}
