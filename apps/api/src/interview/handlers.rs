//! Axum route handlers for interview question generation.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::generator::generate_questions;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<String>,
}

/// POST /tts/generate_questions_for_job
///
/// Generates interview questions for a job description and makes them the
/// current question set for audio rendering.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    payload: Result<Json<GenerateQuestionsRequest>, JsonRejection>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    let Json(request) = payload?;
    let questions = generate_questions(
        state.llm.as_ref(),
        &state.questions,
        &request.job_description,
    )
    .await?;

    Ok(Json(GenerateQuestionsResponse { questions }))
}
