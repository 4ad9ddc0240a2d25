//! Interview question generation.
//!
//! Flow: validate → prompt → LLM complete (backend-specific params) →
//!       list extraction → replace the current question set.
//!
//! The current set is only replaced after a successful generation; any
//! failure leaves the previous set (and its audio) untouched.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::parser::extract_questions;
use crate::interview::prompts::{QUESTION_COUNT, QUESTION_PROMPT_TEMPLATE};
use crate::llm_client::Generator;
use crate::speech::QuestionStore;

pub fn build_question_prompt(job_description: &str) -> String {
    QUESTION_PROMPT_TEMPLATE.replace("{job_description}", job_description)
}

pub async fn generate_questions(
    llm: &dyn Generator,
    store: &QuestionStore,
    job_description: &str,
) -> Result<Vec<String>, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "job_description cannot be empty".to_string(),
        ));
    }

    let prompt = build_question_prompt(job_description);
    let params = llm.provider().question_params();
    let raw = llm
        .complete(&prompt, &params)
        .await
        .map_err(|e| AppError::GenerationFailed(format!("question generation failed: {e}")))?;

    if raw.trim().is_empty() {
        return Err(AppError::GenerationFailed(
            "question generation returned an empty body".to_string(),
        ));
    }

    let questions = extract_questions(&raw);
    if questions.len() != QUESTION_COUNT {
        warn!(
            "Expected {QUESTION_COUNT} questions, parsed {} from model output",
            questions.len()
        );
    }

    store.replace(questions.clone()).await;
    info!("Generated {} interview questions", questions.len());
    Ok(questions)
}
