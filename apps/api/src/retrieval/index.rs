//! Flat in-process cosine index loaded from `<INDEX_DIR>/documents.jsonl`.
//!
//! Record format, one JSON object per line:
//! `{"content": "title: ...\n...", "metadata": {"title": "...", "url": "..."}, "embedding": [..]}`

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Embedder, JobDocument, JobIndex, JobMetadata, RetrievalError, SearchHit};

pub const INDEX_FILE: &str = "documents.jsonl";

#[derive(Debug, Deserialize)]
struct IndexRecord {
    content: String,
    #[serde(default)]
    metadata: JobMetadata,
    embedding: Vec<f32>,
}

struct IndexedJob {
    document: JobDocument,
    embedding: Vec<f32>,
    norm: f32,
}

pub struct FlatJobIndex {
    embedder: Arc<dyn Embedder>,
    jobs: Vec<IndexedJob>,
    dimension: usize,
}

impl FlatJobIndex {
    /// Loads the persisted index. A missing directory or file is fatal at startup.
    pub async fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, RetrievalError> {
        if !dir.is_dir() {
            return Err(RetrievalError::MissingIndex(dir.to_path_buf()));
        }
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(RetrievalError::MissingIndex(path));
        }

        info!("Loading job index from {}...", path.display());
        let raw = tokio::fs::read_to_string(&path).await?;
        let index = Self::from_jsonl(&raw, embedder)?;
        info!(
            "Job index loaded: {} postings, dimension {}",
            index.len(),
            index.dimension
        );
        Ok(index)
    }

    pub fn from_jsonl(raw: &str, embedder: Arc<dyn Embedder>) -> Result<Self, RetrievalError> {
        let mut entries = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: IndexRecord = serde_json::from_str(line)
                .map_err(|source| RetrievalError::Corrupt { line: i + 1, source })?;
            entries.push((
                JobDocument {
                    content: record.content,
                    metadata: record.metadata,
                },
                record.embedding,
            ));
        }
        Self::new(entries, embedder)
    }

    /// Every vector must be non-empty and share the first vector's dimension.
    pub fn new(
        entries: Vec<(JobDocument, Vec<f32>)>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut jobs = Vec::with_capacity(entries.len());

        for (position, (document, embedding)) in entries.into_iter().enumerate() {
            if embedding.is_empty() {
                return Err(RetrievalError::EmptyVector {
                    position: position + 1,
                });
            }
            if embedding.len() != dimension {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimension,
                    got: embedding.len(),
                });
            }
            let norm = l2_norm(&embedding);
            jobs.push(IndexedJob {
                document,
                embedding,
                norm,
            });
        }

        Ok(Self {
            embedder,
            jobs,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobIndex for FlatJobIndex {
    async fn search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        if self.jobs.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;
        if query_vec.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                got: query_vec.len(),
            });
        }
        let query_norm = l2_norm(&query_vec);

        let mut scored: Vec<(usize, f32)> = self
            .jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (i, cosine(&query_vec, query_norm, &job.embedding, job.norm)))
            .collect();
        // Stable: equal scores keep index order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(fetch_k.max(k));

        let mut seen = HashSet::new();
        let mut hits = Vec::with_capacity(k);
        for (i, score) in scored {
            let document = &self.jobs[i].document;
            if !seen.insert(dedup_key(document)) {
                continue;
            }
            hits.push(SearchHit {
                document: document.clone(),
                score,
            });
            if hits.len() == k {
                break;
            }
        }

        debug!(
            "Job search returned {} hits (k={k}, fetch_k={fetch_k})",
            hits.len()
        );
        Ok(hits)
    }
}

/// Postings are the same when they share a URL, or share content when no URL is known.
fn dedup_key(document: &JobDocument) -> &str {
    match document.metadata.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url,
        _ => &document.content,
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedEmbedder;

    fn doc(content: &str, url: Option<&str>) -> JobDocument {
        JobDocument {
            content: content.to_string(),
            metadata: JobMetadata {
                title: None,
                url: url.map(String::from),
                extra: Default::default(),
            },
        }
    }

    fn index_with(entries: Vec<(JobDocument, Vec<f32>)>, query: Vec<f32>) -> FlatJobIndex {
        FlatJobIndex::new(entries, Arc::new(FixedEmbedder::new(query))).unwrap()
    }

    #[tokio::test]
    async fn test_hits_are_ranked_by_similarity() {
        let index = index_with(
            vec![
                (doc("far", Some("u1")), vec![0.0, 1.0]),
                (doc("near", Some("u2")), vec![1.0, 0.0]),
                (doc("mid", Some("u3")), vec![1.0, 1.0]),
            ],
            vec![1.0, 0.0],
        );

        let hits = index.search("q", 5, 50).await.unwrap();
        let contents: Vec<_> = hits.iter().map(|h| h.document.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "mid", "far"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_result_is_truncated_to_k() {
        let entries = (0..20)
            .map(|i| (doc(&format!("job {i}"), None), vec![1.0, i as f32]))
            .collect();
        let index = index_with(entries, vec![1.0, 0.0]);

        let hits = index.search("q", 5, 50).await.unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].document.content, "job 0");
    }

    #[tokio::test]
    async fn test_duplicate_postings_are_collapsed() {
        let index = index_with(
            vec![
                (doc("posting a", Some("https://jobs/1")), vec![1.0, 0.0]),
                (doc("posting a (repost)", Some("https://jobs/1")), vec![0.9, 0.1]),
                (doc("posting b", Some("https://jobs/2")), vec![0.5, 0.5]),
            ],
            vec![1.0, 0.0],
        );

        let hits = index.search("q", 5, 50).await.unwrap();
        let contents: Vec<_> = hits.iter().map(|h| h.document.content.as_str()).collect();
        assert_eq!(contents, vec!["posting a", "posting b"]);
    }

    #[tokio::test]
    async fn test_fetch_k_limits_candidate_pool() {
        let index = index_with(
            vec![
                (doc("same", None), vec![1.0, 0.0]),
                (doc("same", None), vec![1.0, 0.0]),
                (doc("other", None), vec![0.0, 1.0]),
            ],
            vec![1.0, 0.0],
        );

        // Only the two identical postings are considered, so one survives dedup.
        let hits = index.search("q", 2, 2).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_hits_without_embedding() {
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0]));
        let index = FlatJobIndex::new(Vec::new(), embedder.clone()).unwrap();

        let hits = index.search("q", 5, 50).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_an_error() {
        let index = index_with(vec![(doc("a", None), vec![1.0, 0.0])], vec![1.0, 0.0, 0.0]);
        let result = index.search("q", 5, 50).await;
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn test_from_jsonl_parses_records_and_skips_blank_lines() {
        let raw = concat!(
            r#"{"content": "title: 백엔드 개발자\n서울", "metadata": {"title": "백엔드 개발자", "url": "https://jobs/1", "company": "ACME"}, "embedding": [0.1, 0.2]}"#,
            "\n\n",
            r#"{"content": "no metadata here", "embedding": [0.3, 0.4]}"#,
            "\n"
        );
        let index = FlatJobIndex::from_jsonl(raw, Arc::new(FixedEmbedder::new(vec![1.0, 0.0])))
            .unwrap();

        assert_eq!(index.len(), 2);
        let first = &index.jobs[0].document;
        assert_eq!(first.metadata.url.as_deref(), Some("https://jobs/1"));
        assert_eq!(first.metadata.extra["company"], "ACME");
        assert!(index.jobs[1].document.metadata.url.is_none());
    }

    #[test]
    fn test_from_jsonl_reports_corrupt_line() {
        let raw = "{\"content\": \"a\", \"embedding\": [1.0]}\nnot json\n";
        let result = FlatJobIndex::from_jsonl(raw, Arc::new(FixedEmbedder::new(vec![1.0])));
        assert!(matches!(result, Err(RetrievalError::Corrupt { line: 2, .. })));
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let result = FlatJobIndex::new(
            vec![
                (doc("a", None), vec![1.0, 0.0]),
                (doc("b", None), vec![1.0]),
            ],
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        );
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_vector_is_rejected() {
        let result = FlatJobIndex::new(
            vec![(doc("a", None), vec![])],
            Arc::new(FixedEmbedder::new(vec![1.0])),
        );
        assert!(matches!(
            result,
            Err(RetrievalError::EmptyVector { position: 1 })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = FlatJobIndex::load(&missing, Arc::new(FixedEmbedder::new(vec![1.0]))).await;
        assert!(matches!(result, Err(RetrievalError::MissingIndex(_))));

        let result = FlatJobIndex::load(dir.path(), Arc::new(FixedEmbedder::new(vec![1.0]))).await;
        assert!(matches!(result, Err(RetrievalError::MissingIndex(p)) if p.ends_with(INDEX_FILE)));
    }

    #[tokio::test]
    async fn test_load_reads_index_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(INDEX_FILE),
            "{\"content\": \"title: a\", \"embedding\": [1.0, 0.0]}\n",
        )
        .unwrap();

        let index = FlatJobIndex::load(dir.path(), Arc::new(FixedEmbedder::new(vec![1.0, 0.0])))
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }
}
