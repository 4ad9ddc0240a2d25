pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingest::handlers::handle_resume_upload;
use crate::interview::handlers::handle_generate_questions;
use crate::recommend::handlers::handle_recommend;
use crate::speech::handlers::{handle_fetch_audio, handle_render_question};
use crate::state::AppState;

/// Upper bound for resume uploads.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation
        .route("/rag/recommend", post(handle_recommend))
        // Interview questions + audio
        .route(
            "/tts/generate_questions_for_job",
            post(handle_generate_questions),
        )
        .route("/tts/:question_index", get(handle_render_question))
        .route("/static/:filename", get(handle_fetch_audio))
        // Resume
        .route(
            "/resume/upload",
            post(handle_resume_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
