// Session Question Store + TTS
// Keeps the most recently generated interview questions and renders each one
// to an MP3 on first request. Synthesis goes through `SpeechSynthesizer` only.

pub mod google;
pub mod handlers;
pub mod store;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::retry::Transient;

pub use google::GoogleTts;
pub use store::{QuestionStore, RenderedQuestion};

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("nothing to synthesize")]
    EmptyText,

    #[error("TTS HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TTS API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("TTS service returned no audio")]
    EmptyAudio,

    #[error("TTS call timed out after {0:?}")]
    Timeout(Duration),
}

impl Transient for TtsError {
    fn is_transient(&self) -> bool {
        match self {
            TtsError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TtsError::Api { status, .. } => *status == 429 || *status >= 500,
            TtsError::Timeout(_) => true,
            TtsError::EmptyText | TtsError::EmptyAudio => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        TtsError::Timeout(after)
    }
}

/// Text → MP3 capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Bytes, TtsError>;
}
