use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::Provider;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or the LLM provider is unknown.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm_provider: Provider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub local_llm_url: String,
    pub local_llm_model: String,
    pub index_dir: PathBuf,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub tts_url: String,
    pub tts_language: String,
    pub audio_dir: PathBuf,
    pub external_timeout: Duration,
    pub cors_origin: String,
    /// Attach the generated narrative answer to recommendation responses.
    pub recommend_summary: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let raw_provider = var("LLM_PROVIDER").unwrap_or_default();
        let Some(llm_provider) = Provider::parse(&raw_provider) else {
            bail!(
                "No LLM provider: LLM_PROVIDER must be 'mlx', 'local' or 'openai' (got '{raw_provider}')"
            );
        };

        let openai_api_key = match llm_provider {
            Provider::Hosted => Some(require("OPENAI_API_KEY")?),
            Provider::Local => var("OPENAI_API_KEY"),
        };

        let timeout_secs = or_default("EXTERNAL_TIMEOUT_SECS", "60")
            .parse::<u64>()
            .context("EXTERNAL_TIMEOUT_SECS must be a whole number of seconds")?;

        let recommend_summary = or_default("RECOMMEND_SUMMARY", "true")
            .parse::<bool>()
            .context("RECOMMEND_SUMMARY must be 'true' or 'false'")?;

        Ok(Config {
            port: or_default("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
            llm_provider,
            openai_api_key,
            openai_base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: or_default("OPENAI_MODEL", "gpt-4o-mini"),
            local_llm_url: or_default("LOCAL_LLM_URL", "http://localhost:8080/v1"),
            local_llm_model: or_default("LOCAL_LLM_MODEL", "mlx-community/gemma-2-2b-it-4bit"),
            index_dir: PathBuf::from(require("INDEX_DIR")?),
            embedding_url: or_default("EMBEDDING_URL", "http://localhost:8081/v1"),
            embedding_model: or_default("EMBEDDING_MODEL", "dragonkue/bge-m3-ko"),
            embedding_api_key: var("EMBEDDING_API_KEY"),
            tts_url: or_default("TTS_URL", "https://translate.google.com/translate_tts"),
            tts_language: or_default("TTS_LANGUAGE", "ko"),
            audio_dir: PathBuf::from(or_default("AUDIO_DIR", "static")),
            external_timeout: Duration::from_secs(timeout_secs),
            cors_origin: or_default("CORS_ORIGIN", "http://localhost:3000"),
            recommend_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_local_provider_with_defaults() {
        let config =
            Config::from_lookup(lookup(&[("LLM_PROVIDER", "mlx"), ("INDEX_DIR", "/data/idx")]))
                .unwrap();

        assert_eq!(config.llm_provider, Provider::Local);
        assert_eq!(config.port, 8000);
        assert_eq!(config.index_dir, PathBuf::from("/data/idx"));
        assert_eq!(config.tts_language, "ko");
        assert_eq!(config.external_timeout, Duration::from_secs(60));
        assert!(config.recommend_summary);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_provider_is_fatal() {
        let err = Config::from_lookup(lookup(&[("INDEX_DIR", "/data/idx")])).unwrap_err();
        assert!(err.to_string().contains("No LLM provider"));
    }

    #[test]
    fn test_unknown_provider_is_fatal() {
        let err = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "llama"),
            ("INDEX_DIR", "/data/idx"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("llama"));
    }

    #[test]
    fn test_openai_requires_api_key() {
        let err = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("INDEX_DIR", "/data/idx"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let config = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("INDEX_DIR", "/data/idx"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.llm_provider, Provider::Hosted);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_index_dir_is_required() {
        let err = Config::from_lookup(lookup(&[("LLM_PROVIDER", "local")])).unwrap_err();
        assert!(err.to_string().contains("INDEX_DIR"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "local"),
            ("INDEX_DIR", "/data/idx"),
            ("PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }
}
