//! In-memory implementations of the persistence ports.
//!
//! Adapters for tests that exercise the executor, stages and HTTP API without
//! touching disk. Values are replaced whole under a lock, so readers never
//! observe a partial update.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    identifiers::is_plain_file_name, ArtifactStore, PipelineStatus, QuarterlyShift, RawTranscript,
    SentimentRecord, StatusStore, StoreError, StrategicFocuses, TranscriptName, TranscriptSections,
};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A [`StatusStore`] holding the record in memory only.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    status: RwLock<Option<PipelineStatus>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn get(&self) -> Result<PipelineStatus, StoreError> {
        Ok(self.status.read().await.clone().unwrap_or_default())
    }

    async fn set(&self, status: PipelineStatus) -> Result<(), StoreError> {
        *self.status.write().await = Some(status);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Artifacts {
    raw: BTreeMap<TranscriptName, String>,
    sections: BTreeMap<TranscriptName, TranscriptSections>,
    sentiment: Option<Vec<SentimentRecord>>,
    focuses: Option<StrategicFocuses>,
    shift: Option<QuarterlyShift>,
    transcript_summaries: BTreeMap<TranscriptName, String>,
    shift_summary: Option<String>,
}

/// An [`ArtifactStore`] holding every artifact in memory.
///
/// Processed files are exposed under the same names the filesystem store
/// uses: `<name>_prepared.txt`, `<name>_qa.txt` and `<name>_cleaned.txt`.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    inner: RwLock<Artifacts>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-transcript summary written by the theme stage, if any.
    pub async fn transcript_summary(&self, name: &TranscriptName) -> Option<String> {
        self.inner.read().await.transcript_summaries.get(name).cloned()
    }
}

fn not_found(artifact: impl Into<String>) -> StoreError {
    StoreError::NotFound {
        artifact: artifact.into(),
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn write_raw_transcript(&self, transcript: &RawTranscript) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .raw
            .insert(transcript.name.clone(), transcript.text.clone());
        Ok(())
    }

    async fn list_raw_transcripts(&self) -> Result<Vec<TranscriptName>, StoreError> {
        Ok(self.inner.read().await.raw.keys().cloned().collect())
    }

    async fn read_raw_transcript(&self, name: &TranscriptName) -> Result<String, StoreError> {
        self.inner
            .read()
            .await
            .raw
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("{name}.txt")))
    }

    async fn write_sections(
        &self,
        name: &TranscriptName,
        sections: &TranscriptSections,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sections
            .insert(name.clone(), sections.clone());
        Ok(())
    }

    async fn list_processed(&self) -> Result<Vec<TranscriptName>, StoreError> {
        Ok(self.inner.read().await.sections.keys().cloned().collect())
    }

    async fn read_sections(&self, name: &TranscriptName) -> Result<TranscriptSections, StoreError> {
        self.inner
            .read()
            .await
            .sections
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("{name}_prepared.txt")))
    }

    async fn list_processed_files(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        let mut files: Vec<String> = inner
            .sections
            .keys()
            .flat_map(|name| {
                ["cleaned", "prepared", "qa"].map(|suffix| format!("{name}_{suffix}.txt"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    async fn read_processed_file(&self, file_name: &str) -> Result<String, StoreError> {
        if !is_plain_file_name(file_name) {
            return Err(StoreError::InvalidName {
                name: file_name.to_string(),
            });
        }
        let inner = self.inner.read().await;
        for (name, sections) in &inner.sections {
            let base = name.as_str();
            if file_name == format!("{base}_prepared.txt") {
                return Ok(sections.management.clone());
            }
            if file_name == format!("{base}_qa.txt") {
                return Ok(sections.qa.clone());
            }
            if file_name == format!("{base}_cleaned.txt") {
                return Ok(sections.combined());
            }
        }
        Err(not_found(file_name))
    }

    async fn write_sentiment_results(&self, records: &[SentimentRecord]) -> Result<(), StoreError> {
        self.inner.write().await.sentiment = Some(records.to_vec());
        Ok(())
    }

    async fn read_sentiment_results(&self) -> Result<Vec<SentimentRecord>, StoreError> {
        self.inner
            .read()
            .await
            .sentiment
            .clone()
            .ok_or_else(|| not_found("sentiment_results.json"))
    }

    async fn write_strategic_focuses(&self, focuses: &StrategicFocuses) -> Result<(), StoreError> {
        self.inner.write().await.focuses = Some(focuses.clone());
        Ok(())
    }

    async fn read_strategic_focuses(&self) -> Result<StrategicFocuses, StoreError> {
        self.inner
            .read()
            .await
            .focuses
            .clone()
            .ok_or_else(|| not_found("strategic_focuses.json"))
    }

    async fn write_quarterly_shift(&self, shift: &QuarterlyShift) -> Result<(), StoreError> {
        self.inner.write().await.shift = Some(shift.clone());
        Ok(())
    }

    async fn read_quarterly_shift(&self) -> Result<QuarterlyShift, StoreError> {
        self.inner
            .read()
            .await
            .shift
            .clone()
            .ok_or_else(|| not_found("quarterly_shift.json"))
    }

    async fn write_transcript_summary(
        &self,
        name: &TranscriptName,
        summary: &str,
    ) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .transcript_summaries
            .insert(name.clone(), summary.to_string());
        Ok(())
    }

    async fn write_shift_summary(&self, summary: &str) -> Result<(), StoreError> {
        self.inner.write().await.shift_summary = Some(summary.to_string());
        Ok(())
    }

    async fn read_shift_summary(&self) -> Result<String, StoreError> {
        self.inner
            .read()
            .await
            .shift_summary
            .clone()
            .ok_or_else(|| not_found("quarterly_shift_summary.txt"))
    }
}
