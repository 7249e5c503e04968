// Document and question-batch ingestion
// Resolves the input format once at the boundary into a tagged source variant


use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{QaError, Result};

/// Kind of a loaded document, carried as source metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Json,
    Pdf,
}

impl DocumentKind {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Json => "json",
            DocumentKind::Pdf => "pdf",
        }
    }
}

/// A context file with its format resolved from the file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Json(PathBuf),
    Pdf(PathBuf),
}

/// Raw document text plus source metadata. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source_name: String,
    pub kind: DocumentKind,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    question: String,
}

impl DocumentSource {
    /// Resolve the source variant from the file extension.
    #[inline]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(DocumentSource::Json(path.to_path_buf())),
            Some("pdf") => Ok(DocumentSource::Pdf(path.to_path_buf())),
            _ => Err(QaError::UnsupportedFormat(format!(
                "{}: context file must be .json or .pdf",
                path.display()
            ))),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        match self {
            DocumentSource::Json(path) | DocumentSource::Pdf(path) => path,
        }
    }

    /// Read the file into a [`Document`].
    ///
    /// JSON files are loaded verbatim as structured text; PDF files are
    /// extracted page by page and joined with newlines.
    #[inline]
    pub fn load(&self) -> Result<Document> {
        let source_name = self
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string());

        let document = match self {
            DocumentSource::Json(path) => {
                let text = fs::read_to_string(path)?;
                debug!("Loaded JSON context file ({} bytes)", text.len());
                Document {
                    text,
                    source_name,
                    kind: DocumentKind::Json,
                }
            }
            DocumentSource::Pdf(path) => {
                let text = extract_pdf_text(path)?;
                debug!("Extracted PDF context file ({} chars)", text.len());
                Document {
                    text,
                    source_name,
                    kind: DocumentKind::Pdf,
                }
            }
        };

        info!(
            "Loaded {} document '{}' ({} chars)",
            document.kind.as_str(),
            document.source_name,
            document.text.len()
        );
        Ok(document)
    }
}

/// Extract text from every page of a PDF, in page order.
fn extract_pdf_text(path: &Path) -> Result<String> {
    let pdf = lopdf::Document::load(path)
        .map_err(|e| QaError::MalformedInput(format!("{}: {}", path.display(), e)))?;

    let mut pages: Vec<String> = Vec::new();
    for (&page_number, _) in &pdf.get_pages() {
        let page_text = pdf
            .extract_text(&[page_number])
            .map_err(|e| QaError::MalformedInput(format!("page {}: {}", page_number, e)))?;
        pages.push(page_text);
    }

    Ok(pages.join("\n"))
}

/// Read an ordered question batch from a JSON array of `{"question": ...}`
/// objects.
#[inline]
pub fn read_question_batch<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let entries: Vec<QuestionEntry> = serde_json::from_str(&content).map_err(|e| {
        QaError::MalformedInput(format!(
            "{}: expected a JSON array of objects with a 'question' field: {}",
            path.display(),
            e
        ))
    })?;

    debug!("Read {} questions from {}", entries.len(), path.display());
    Ok(entries.into_iter().map(|entry| entry.question).collect())
}
