use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::Generator;
use crate::retrieval::JobIndex;
use crate::speech::{QuestionStore, SpeechSynthesizer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Selected once at startup from LLM_PROVIDER.
    pub llm: Arc<dyn Generator>,
    pub index: Arc<dyn JobIndex>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    /// Current interview question set and its rendered audio.
    pub questions: Arc<QuestionStore>,
    pub config: Config,
}
