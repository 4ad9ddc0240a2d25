//! In-memory fakes for the external capabilities, shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::llm_client::{GenerationParams, Generator, LlmError, Provider};
use crate::retrieval::{Embedder, JobDocument, JobIndex, RetrievalError, SearchHit};
use crate::speech::{SpeechSynthesizer, TtsError};

// ────────────────────────────────────────────────────────────────────────────
// Retrieval
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same query vector for every input.
pub struct FixedEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

pub fn hit(content: &str) -> SearchHit {
    SearchHit {
        document: JobDocument {
            content: content.to_string(),
            metadata: Default::default(),
        },
        score: 1.0,
    }
}

/// Serves a canned hit list regardless of the query.
pub struct FakeIndex {
    hits: Option<Vec<SearchHit>>,
    calls: AtomicUsize,
    last_params: Mutex<Option<(usize, usize)>>,
}

impl FakeIndex {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<(usize, usize)> {
        *self.last_params.lock().unwrap()
    }
}

#[async_trait]
impl JobIndex for FakeIndex {
    async fn search(
        &self,
        _query: &str,
        k: usize,
        fetch_k: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some((k, fetch_k));
        match &self.hits {
            Some(hits) => Ok(hits.clone()),
            None => Err(RetrievalError::Api {
                status: 503,
                message: "embedding service down".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeGenerator {
    reply: Option<String>,
    provider: Provider,
    calls: AtomicUsize,
    last_call: Mutex<Option<(String, GenerationParams)>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            provider: Provider::Hosted,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            provider: Provider::Hosted,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, GenerationParams)> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((prompt.to_string(), params.clone()));
        self.reply.clone().ok_or(LlmError::Api {
            status: 500,
            message: "model crashed".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Speech
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeSynthesizer {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Deterministic stand-in audio for `text`.
    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("ID3:{text}").into_bytes()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Bytes, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TtsError::Api {
                status: 503,
                message: "tts unavailable".to_string(),
            });
        }
        Ok(Bytes::from(Self::audio_for(text)))
    }
}
