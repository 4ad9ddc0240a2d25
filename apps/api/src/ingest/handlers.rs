//! Axum route handlers for resume upload.

use anyhow::anyhow;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::{extension_of, load_document, summarize_resume};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeSummaryResponse {
    pub summary: String,
}

/// POST /resume/upload
///
/// Multipart form with a single `file` field (PDF or DOCX). Returns a
/// one-sentence summary of the extracted text.
pub async fn handle_resume_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeSummaryResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("failed to read upload: {e}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::InvalidInput("missing 'file' field".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("uploaded file is empty".to_string()));
    }

    let extension = extension_of(&file_name);
    info!("Resume upload: {} ({} bytes)", file_name, bytes.len());

    // pdf-extract can panic on malformed input; a panic surfaces as a JoinError.
    let text = tokio::task::spawn_blocking(move || load_document(&bytes, &extension))
        .await
        .map_err(|e| anyhow!("document extraction aborted: {e}"))??;

    let summary = summarize_resume(state.llm.as_ref(), &text).await?;
    Ok(Json(ResumeSummaryResponse { summary }))
}
