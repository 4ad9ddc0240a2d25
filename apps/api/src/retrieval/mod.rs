//! Embedding & vector index over job postings.
//!
//! The orchestrators only see `JobIndex::search`; the index embeds the query
//! through an `Embedder` and ranks the persisted postings by cosine similarity.

pub mod embedder;
pub mod index;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::retry::Transient;

pub use embedder::HttpEmbedder;
pub use index::FlatJobIndex;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("index file not found at {0}")]
    MissingIndex(PathBuf),

    #[error("failed to read index: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed index record on line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("index record {position} has an empty embedding")]
    EmptyVector { position: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding service returned no vector")]
    EmptyEmbedding,

    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),
}

impl Transient for RetrievalError {
    fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            RetrievalError::Api { status, .. } => *status == 429 || *status >= 500,
            RetrievalError::Timeout(_) => true,
            _ => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        RetrievalError::Timeout(after)
    }
}

/// Metadata stored alongside an indexed posting. Unknown keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A job posting as stored in the index. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: JobMetadata,
}

/// One ranked search result. Higher score = more similar.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: JobDocument,
    pub score: f32,
}

/// Text → vector capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Similarity search over job postings.
#[async_trait]
pub trait JobIndex: Send + Sync {
    /// Considers the best `fetch_k` candidates, then returns at most `k` hits,
    /// most similar first.
    async fn search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError>;
}
