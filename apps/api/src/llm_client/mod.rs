//! Text generation backends.
//!
//! Orchestrators depend on `Generator` only and never reach a completion API
//! themselves. The concrete backend is picked once at startup from `LLM_PROVIDER`.
//!
//! Both backends speak the OpenAI-compatible chat completions protocol:
//! - `LocalModel`: a locally hosted model server (e.g. `mlx_lm.server`), no auth.
//! - `HostedModel`: the hosted OpenAI API, bearer auth.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::retry::{with_retry, Transient};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Timeout(_) => true,
            LlmError::EmptyContent => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        LlmError::Timeout(after)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider + parameters
// ────────────────────────────────────────────────────────────────────────────

/// Which backend family answers completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Local,
    Hosted,
}

impl Provider {
    /// Parses the `LLM_PROVIDER` value. `mlx` is kept as an alias of `local`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mlx" | "local" => Some(Provider::Local),
            "openai" => Some(Provider::Hosted),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Hosted => "openai",
        }
    }

    /// Interview question generation: local gets a token budget, hosted temperature only.
    pub fn question_params(&self) -> GenerationParams {
        match self {
            Provider::Local => GenerationParams {
                temperature: 0.7,
                max_tokens: Some(8192),
            },
            Provider::Hosted => GenerationParams {
                temperature: 0.7,
                max_tokens: None,
            },
        }
    }

    /// Narrative job-list answer attached to recommendations.
    pub fn recommendation_params(&self) -> GenerationParams {
        match self {
            Provider::Local => GenerationParams {
                temperature: 0.2,
                max_tokens: Some(1000),
            },
            Provider::Hosted => GenerationParams {
                temperature: 0.2,
                max_tokens: None,
            },
        }
    }

    /// One-sentence resume summary.
    pub fn summary_params(&self) -> GenerationParams {
        match self {
            Provider::Local => GenerationParams {
                temperature: 0.7,
                max_tokens: Some(512),
            },
            Provider::Hosted => GenerationParams {
                temperature: 0.7,
                max_tokens: None,
            },
        }
    }
}

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Capability trait
// ────────────────────────────────────────────────────────────────────────────

/// Text completion capability. Carried in `AppState` as `Arc<dyn Generator>`.
#[async_trait]
pub trait Generator: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the completion text. Blank completions are `LlmError::EmptyContent`.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Shared chat-completions client used by both backends.
#[derive(Clone)]
struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatClient {
    fn new(
        base_url: &str,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            api_key,
            timeout,
        })
    }

    async fn chat(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        with_retry("LLM call", self.timeout, move || self.send_once(prompt, params)).await
    }

    async fn send_once(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backends
// ────────────────────────────────────────────────────────────────────────────

/// Locally hosted model server.
pub struct LocalModel(ChatClient);

impl LocalModel {
    pub fn new(base_url: &str, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self(ChatClient::new(base_url, model, None, timeout)?))
    }
}

#[async_trait]
impl Generator for LocalModel {
    fn provider(&self) -> Provider {
        Provider::Local
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        self.0.chat(prompt, params).await
    }
}

/// Hosted OpenAI API.
pub struct HostedModel(ChatClient);

impl HostedModel {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self(ChatClient::new(base_url, model, Some(api_key), timeout)?))
    }
}

#[async_trait]
impl Generator for HostedModel {
    fn provider(&self) -> Provider {
        Provider::Hosted
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        self.0.chat(prompt, params).await
    }
}

/// Builds the backend selected by configuration.
pub fn build_generator(config: &Config) -> Result<Arc<dyn Generator>, LlmError> {
    let generator: Arc<dyn Generator> = match config.llm_provider {
        Provider::Local => Arc::new(LocalModel::new(
            &config.local_llm_url,
            config.local_llm_model.clone(),
            config.external_timeout,
        )?),
        Provider::Hosted => Arc::new(HostedModel::new(
            &config.openai_base_url,
            config.openai_api_key.clone().unwrap_or_default(),
            config.openai_model.clone(),
            config.external_timeout,
        )?),
    };
    Ok(generator)
}
