//! List extraction from free-text model output.
//!
//! Accepted item lines: `- item` or `N. item` (optionally indented). Every other
//! line is prose and is dropped. `**` emphasis is removed first.

use std::sync::LazyLock;

use regex::Regex;

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:-|\d+\.)[ \t]+(.*)$").expect("list item pattern is valid")
});

static LEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-|\d+\.)(?:\s+|$)").expect("marker pattern is valid"));

/// Extracts list items in order. Never fails; unusable output yields an empty list.
pub fn extract_questions(raw: &str) -> Vec<String> {
    let cleaned = raw.replace("**", "");
    cleaned
        .lines()
        .filter_map(|line| LIST_ITEM.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_markers(m.as_str()))
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Removes nested markers such as `- 1. question`.
fn strip_markers(item: &str) -> &str {
    let mut rest = item.trim();
    while let Some(m) = LEADING_MARKER.find(rest) {
        rest = rest[m.end()..].trim();
    }
    rest
}
