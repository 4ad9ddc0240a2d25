//! Structural formatting of retrieved postings. Pure and deterministic; it never
//! depends on the generation step.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::retrieval::{JobDocument, SearchHit};

/// Title used when a posting's first line is not a `title:` line.
pub const NO_TITLE: &str = "no title";

static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*title\s*:(.*)$").expect("title pattern is valid"));

/// A posting as shown to the job seeker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRecommendation {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
}

/// Splits `title: <x>` off the first line of the content.
/// Without that line (or with an empty title) the whole content becomes the description.
pub fn format_recommendation(document: &JobDocument) -> FormattedRecommendation {
    let content = document.content.as_str();
    let (first_line, rest) = content.split_once('\n').unwrap_or((content, ""));
    let url = document
        .metadata
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);

    let title = TITLE_LINE
        .captures(first_line.trim_end_matches('\r'))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty());

    match title {
        Some(title) => FormattedRecommendation {
            title: title.to_string(),
            description: rest.trim().to_string(),
            url,
        },
        None => FormattedRecommendation {
            title: NO_TITLE.to_string(),
            description: content.to_string(),
            url,
        },
    }
}

/// One recommendation per hit, same order.
pub fn format_recommendations(hits: &[SearchHit]) -> Vec<FormattedRecommendation> {
    hits.iter()
        .map(|hit| format_recommendation(&hit.document))
        .collect()
}
