//! Document ingestion: uploaded resume bytes → plain text.
//!
//! Supported: PDF (`pdf-extract`) and Word `.docx` (`docx-rust`). Anything else
//! is `IngestError::Unsupported`, which surfaces as a client error.

pub mod handlers;
pub mod prompts;

use std::io::Cursor;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::ingest::prompts::SUMMARY_PROMPT_TEMPLATE;
use crate::llm_client::Generator;

/// Resume text beyond this many characters is not sent for summarization.
pub const MAX_SUMMARY_INPUT_CHARS: usize = 12_000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type '{0}'")]
    Unsupported(String),

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("failed to read Word document: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Result<Self, IngestError> {
        match extension.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(IngestError::Unsupported(other.to_string())),
        }
    }
}

/// Lower-cased extension of an uploaded file name, or `""` when there is none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Extracts plain text. CPU-bound; call from `spawn_blocking`.
pub fn load_document(bytes: &[u8], extension: &str) -> Result<String, IngestError> {
    let format = DocumentFormat::from_extension(extension)?;
    let text = match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| IngestError::Pdf(e.to_string()))?,
        DocumentFormat::Docx => {
            let file = docx_rust::DocxFile::from_reader(Cursor::new(bytes))
                .map_err(|e| IngestError::Docx(e.to_string()))?;
            let docx = file.parse().map_err(|e| IngestError::Docx(e.to_string()))?;
            docx.document.body.text()
        }
    };
    debug!("Loaded {:?} document: {} chars", format, text.chars().count());
    Ok(text)
}

pub fn build_summary_prompt(text: &str) -> String {
    let clipped: String = text.chars().take(MAX_SUMMARY_INPUT_CHARS).collect();
    SUMMARY_PROMPT_TEMPLATE.replace("{text}", clipped.trim())
}

/// One-sentence summary of a resume's text.
pub async fn summarize_resume(llm: &dyn Generator, text: &str) -> Result<String, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "no text could be extracted from the document".to_string(),
        ));
    }
    let prompt = build_summary_prompt(text);
    let params = llm.provider().summary_params();
    let summary = llm
        .complete(&prompt, &params)
        .await
        .map_err(|e| AppError::GenerationFailed(format!("resume summary failed: {e}")))?;
    Ok(summary.trim().to_string())
}
