//! Axum route handlers for job recommendations.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::recommend::recommender::{recommend, RecommendRequest, RecommendResponse};
use crate::state::AppState;

/// POST /rag/recommend
///
/// Returns up to five postings matching the profile, formatted from the
/// retrieved documents, plus an optional generated summary.
pub async fn handle_recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, AppError> {
    let Json(request) = payload?;
    let response = recommend(
        state.index.as_ref(),
        state.llm.as_ref(),
        &request,
        state.config.recommend_summary,
    )
    .await?;

    Ok(Json(response))
}
