//! Recommendation pipeline.
//!
//! Flow: validate → vector search (k=5, fetch_k=50) → structural formatting →
//!       optional "stuff documents" generation for a narrative summary.
//!
//! The formatted list is the contract. The narrative summary is best-effort:
//! a generation failure is logged and the list is still returned.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::Generator;
use crate::recommend::format::{format_recommendations, FormattedRecommendation};
use crate::recommend::prompts::{DOCUMENT_SEPARATOR, RECOMMENDATION_INSTRUCTIONS};
use crate::retrieval::{JobIndex, SearchHit};

/// Number of recommendations returned.
pub const TOP_K: usize = 5;
/// Candidates considered before the top-k cut.
pub const FETCH_K: usize = 50;

/// Request body for recommendations.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub profile: String,
    /// Reserved for location filtering; accepted and logged only.
    #[serde(default)]
    pub area: String,
    /// Reserved for posting-date filtering (`YYYYMMDD`); accepted and logged only.
    #[serde(default = "today")]
    pub date: String,
}

fn today() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<FormattedRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Runs the recommendation pipeline.
pub async fn recommend(
    index: &dyn JobIndex,
    llm: &dyn Generator,
    request: &RecommendRequest,
    with_summary: bool,
) -> Result<RecommendResponse, AppError> {
    let profile = request.profile.trim();
    if profile.is_empty() {
        return Err(AppError::InvalidInput("profile cannot be empty".to_string()));
    }
    debug!(
        "Recommendation request: area={:?}, date={:?}",
        request.area, request.date
    );

    let mut hits = index.search(profile, TOP_K, FETCH_K).await?;
    hits.truncate(TOP_K);
    if hits.is_empty() {
        info!("No postings retrieved for profile");
        return Ok(RecommendResponse {
            recommendations: Vec::new(),
            summary: None,
        });
    }
    info!("Retrieved {} postings", hits.len());

    let recommendations = format_recommendations(&hits);

    let summary = if with_summary {
        summarize(llm, profile, &hits).await
    } else {
        None
    };

    Ok(RecommendResponse {
        recommendations,
        summary,
    })
}

/// Builds the "stuff documents" prompt: every retrieved posting in one context block.
pub fn build_recommendation_prompt(profile: &str, hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|h| h.document.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR);

    // Assembled in one pass: braces in postings or the profile stay literal.
    format!("{RECOMMENDATION_INSTRUCTIONS}\n\n{context}\n\nProfile: {profile}")
}

async fn summarize(llm: &dyn Generator, profile: &str, hits: &[SearchHit]) -> Option<String> {
    let prompt = build_recommendation_prompt(profile, hits);
    let params = llm.provider().recommendation_params();
    match llm.complete(&prompt, &params).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            warn!("Recommendation summary skipped: {e}");
            None
        }
    }
}
