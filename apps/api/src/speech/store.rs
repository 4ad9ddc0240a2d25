//! Process-wide question set + per-index audio cache.
//!
//! The set and its cache sit behind ONE async mutex, so replacing the set and
//! rendering an index never interleave. Every set gets a fresh generation id
//! and audio files are named `question_<generation>_<index>.mp3`, so audio
//! rendered for an older set can never be served for a newer one.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SpeechSynthesizer;
use crate::errors::AppError;

/// URL prefix under which rendered audio is served.
pub const AUDIO_URL_PREFIX: &str = "/static";

/// In-progress audio writes; never served.
const PARTIAL_SUFFIX: &str = ".part";

/// Text + reference to its rendered audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuestion {
    pub question_text: String,
    pub audio_file: String,
}

struct QuestionSet {
    generation: Uuid,
    questions: Vec<String>,
    /// index → audio file name
    audio: HashMap<usize, String>,
}

pub struct QuestionStore {
    audio_dir: PathBuf,
    language: String,
    current: Mutex<Option<QuestionSet>>,
}

impl QuestionStore {
    pub fn new(audio_dir: PathBuf, language: String) -> Self {
        Self {
            audio_dir,
            language,
            current: Mutex::new(None),
        }
    }

    /// Replaces the current set in full.
    /// Audio rendered for the previous set is deleted best-effort.
    pub async fn replace(&self, questions: Vec<String>) {
        let generation = Uuid::new_v4();
        let previous = {
            let mut current = self.current.lock().await;
            current.replace(QuestionSet {
                generation,
                questions,
                audio: HashMap::new(),
            })
        };
        info!("Question set replaced (generation {generation})");

        if let Some(previous) = previous {
            for file_name in previous.audio.values() {
                let path = self.audio_dir.join(file_name);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => debug!("Removed stale audio {}", path.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to remove stale audio {}: {e}", path.display()),
                }
            }
        }
    }

    #[cfg(test)]
    pub async fn questions(&self) -> Option<Vec<String>> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|set| set.questions.clone())
    }

    /// Returns the question at `index` with its audio, synthesizing on first request.
    pub async fn render(
        &self,
        index: i64,
        tts: &dyn SpeechSynthesizer,
    ) -> Result<RenderedQuestion, AppError> {
        let mut current = self.current.lock().await;
        let set = match current.as_mut() {
            Some(set) if !set.questions.is_empty() => set,
            _ => return Err(AppError::NoQuestionsYet),
        };

        let len = set.questions.len();
        let idx = usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(AppError::IndexOutOfRange { index, len })?;
        let question_text = set.questions[idx].clone();

        if let Some(file_name) = set.audio.get(&idx) {
            let cached = tokio::fs::try_exists(self.audio_dir.join(file_name))
                .await
                .unwrap_or(false);
            if cached {
                debug!("Audio cache hit for question {idx}");
                return Ok(RenderedQuestion {
                    question_text,
                    audio_file: audio_url(file_name),
                });
            }
            warn!("Cached audio {file_name} vanished, re-rendering");
        }

        let file_name = audio_file_name(set.generation, idx);
        let audio = tts.synthesize(&question_text, &self.language).await?;
        self.write_audio(&file_name, &audio).await?;
        set.audio.insert(idx, file_name.clone());
        info!("Rendered question {idx} to {file_name}");

        Ok(RenderedQuestion {
            question_text,
            audio_file: audio_url(&file_name),
        })
    }

    /// Reads a rendered audio file by bare file name.
    pub async fn read_audio(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        if !is_plain_file_name(file_name) {
            return Err(AppError::InvalidInput(format!(
                "invalid audio file name: {file_name}"
            )));
        }
        match tokio::fs::read(self.audio_dir.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("audio file {file_name}")))
            }
            Err(e) => Err(AppError::Internal(
                anyhow::Error::new(e).context(format!("reading audio file {file_name}")),
            )),
        }
    }

    /// Writes to a temporary name first so readers never see a partial file.
    async fn write_audio(&self, file_name: &str, audio: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .with_context(|| format!("creating audio dir {}", self.audio_dir.display()))?;

        let path = self.audio_dir.join(file_name);
        let partial = self.audio_dir.join(format!("{file_name}{PARTIAL_SUFFIX}"));
        let written = match tokio::fs::write(&partial, audio).await {
            Ok(()) => tokio::fs::rename(&partial, &path)
                .await
                .with_context(|| format!("moving audio into {}", path.display())),
            Err(e) => Err(e).with_context(|| format!("writing {}", partial.display())),
        };
        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove partial audio {}: {e}", partial.display());
                }
            }
        }
        written.map_err(AppError::from)
    }
}

pub fn audio_file_name(generation: Uuid, index: usize) -> String {
    format!("question_{}_{index}.mp3", generation.simple())
}

fn audio_url(file_name: &str) -> String {
    format!("{AUDIO_URL_PREFIX}/{file_name}")
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.ends_with(PARTIAL_SUFFIX)
}
