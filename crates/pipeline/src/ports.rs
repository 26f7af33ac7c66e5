//! Port traits implemented by infrastructure crates.
//!
//! The domain defines *what* it needs from the outside world; the `store`,
//! `classifier`, `llm` and `fetcher` crates define *how* it is supplied. All
//! traits are object-safe so the composition root can hold them as
//! `Arc<dyn Trait>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    ClassScores, ClassifierError, FetchError, LlmError, PipelineStatus, QuarterlyShift,
    RawTranscript, SentimentRecord, StageError, StageKind, StoreError, StrategicFocuses,
    TranscriptName, TranscriptSections,
};

// ---------------------------------------------------------------------------
// External models
// ---------------------------------------------------------------------------

/// A three-class sentiment classifier.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classifies one chunk of text, returning a probability per class.
    async fn classify(&self, text: &str) -> Result<ClassScores, ClassifierError>;
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A chat language model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a conversation and returns the assistant's reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Source of the latest earnings call transcripts.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawTranscript>, FetchError>;
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// The persisted pipeline progress record.
///
/// Implementations replace the whole record atomically: a concurrent `get`
/// observes either the previous or the new value, never a mix.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Current status; [`PipelineStatus::idle`] if none was ever recorded.
    async fn get(&self) -> Result<PipelineStatus, StoreError>;

    /// Replaces the status.
    async fn set(&self, status: PipelineStatus) -> Result<(), StoreError>;
}

/// Named artifacts produced and consumed by the stages.
///
/// Every write replaces the whole artifact. Reads of an artifact that has not
/// been produced return [`StoreError::NotFound`].
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn write_raw_transcript(&self, transcript: &RawTranscript) -> Result<(), StoreError>;

    /// Names of all raw transcripts, sorted.
    async fn list_raw_transcripts(&self) -> Result<Vec<TranscriptName>, StoreError>;

    async fn read_raw_transcript(&self, name: &TranscriptName) -> Result<String, StoreError>;

    async fn write_sections(
        &self,
        name: &TranscriptName,
        sections: &TranscriptSections,
    ) -> Result<(), StoreError>;

    /// Names of all transcripts with stored sections, sorted.
    async fn list_processed(&self) -> Result<Vec<TranscriptName>, StoreError>;

    async fn read_sections(&self, name: &TranscriptName) -> Result<TranscriptSections, StoreError>;

    /// File names of every processed text file, sorted.
    async fn list_processed_files(&self) -> Result<Vec<String>, StoreError>;

    /// Contents of one processed text file by its file name.
    async fn read_processed_file(&self, file_name: &str) -> Result<String, StoreError>;

    async fn write_sentiment_results(&self, records: &[SentimentRecord]) -> Result<(), StoreError>;

    async fn read_sentiment_results(&self) -> Result<Vec<SentimentRecord>, StoreError>;

    async fn write_strategic_focuses(&self, focuses: &StrategicFocuses) -> Result<(), StoreError>;

    async fn read_strategic_focuses(&self) -> Result<StrategicFocuses, StoreError>;

    async fn write_quarterly_shift(&self, shift: &QuarterlyShift) -> Result<(), StoreError>;

    async fn read_quarterly_shift(&self) -> Result<QuarterlyShift, StoreError>;

    async fn write_transcript_summary(
        &self,
        name: &TranscriptName,
        summary: &str,
    ) -> Result<(), StoreError>;

    async fn write_shift_summary(&self, summary: &str) -> Result<(), StoreError>;

    async fn read_shift_summary(&self) -> Result<String, StoreError>;
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// One unit of work in the fixed pipeline sequence.
///
/// A stage either returns normally or fails; it knows nothing about status
/// reporting, which belongs to the executor.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    async fn run(&self) -> Result<(), StageError>;
}
