//! Axum route handlers for question audio.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::errors::AppError;
use crate::speech::RenderedQuestion;
use crate::state::AppState;

/// GET /tts/:question_index
///
/// Returns the question text and a reference to its rendered audio,
/// synthesizing it on the first request for this question set.
pub async fn handle_render_question(
    State(state): State<AppState>,
    Path(raw_index): Path<String>,
) -> Result<Json<RenderedQuestion>, AppError> {
    let index = raw_index.trim().parse::<i64>().map_err(|_| {
        AppError::InvalidInput(format!("question index must be an integer, got '{raw_index}'"))
    })?;

    let rendered = state.questions.render(index, state.tts.as_ref()).await?;
    Ok(Json(rendered))
}

/// GET /static/:filename
///
/// Serves a rendered audio file byte-for-byte, or 404 when it does not exist.
pub async fn handle_fetch_audio(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.questions.read_audio(&file_name).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes))
}
