use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;
use crate::llm_client::LlmError;
use crate::retrieval::RetrievalError;
use crate::speech::TtsError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No questions have been generated yet.")]
    NoQuestionsYet,

    #[error("Invalid question index. Received: {index}, but list length is {len}.")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::NoQuestionsYet => "NO_QUESTIONS_YET",
            AppError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RetrievalUnavailable(_) => "RETRIEVAL_UNAVAILABLE",
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::SynthesisFailed(_) => "SYNTHESIS_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::UnsupportedFormat(_)
            | AppError::NoQuestionsYet
            | AppError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RetrievalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GenerationFailed(_) | AppError::SynthesisFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RetrievalError> for AppError {
    fn from(e: RetrievalError) -> Self {
        AppError::RetrievalUnavailable(e.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::GenerationFailed(e.to_string())
    }
}

impl From<TtsError> for AppError {
    fn from(e: TtsError) -> Self {
        AppError::SynthesisFailed(e.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Unsupported(ext) => {
                AppError::UnsupportedFormat(format!("unsupported file type: {ext}"))
            }
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::RetrievalUnavailable(msg) => {
                tracing::error!("Retrieval error: {msg}");
                self.to_string()
            }
            AppError::GenerationFailed(msg) => {
                tracing::error!("Generation error: {msg}");
                self.to_string()
            }
            AppError::SynthesisFailed(msg) => {
                tracing::error!("TTS error: {msg}");
                self.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_message_names_index_and_length() {
        let err = AppError::IndexOutOfRange { index: 5, len: 3 };
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
        assert_eq!(err.code(), "INDEX_OUT_OF_RANGE");
    }

    #[test]
    fn test_status_codes_by_kind() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NoQuestionsYet.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound("a.mp3".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RetrievalUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::GenerationFailed("empty".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unsupported_ingest_maps_to_unsupported_format() {
        let err: AppError = IngestError::Unsupported("txt".into()).into();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_into_response_body_shape() {
        let response = AppError::NoQuestionsYet.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "NO_QUESTIONS_YET");
        assert_eq!(
            body["error"]["message"],
            "No questions have been generated yet."
        );
    }
}
