use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{
    is_plain_file_name, ArtifactStore, QuarterlyShift, RawTranscript, SentimentRecord, StoreError,
    StrategicFocuses, TranscriptName, TranscriptSections,
};
use tracing::debug;

use crate::atomic::{list_files, read_json, read_text, write_atomic, write_json};

const TRANSCRIPTS_DIR: &str = "transcripts";
const PROCESSED_DIR: &str = "processed_transcripts";
const SUMMARIES_DIR: &str = "summaries";

const SENTIMENT_FILE: &str = "sentiment_results.json";
const FOCUSES_FILE: &str = "strategic_focuses.json";
const SHIFT_FILE: &str = "quarterly_shift.json";
const SHIFT_SUMMARY_FILE: &str = "quarterly_shift_summary.txt";

const PREPARED_SUFFIX: &str = "_prepared.txt";
const QA_SUFFIX: &str = "_qa.txt";
const CLEANED_SUFFIX: &str = "_cleaned.txt";

/// An [`ArtifactStore`] over files under one data directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn processed(&self, file_name: &str) -> PathBuf {
        self.root.join(PROCESSED_DIR).join(file_name)
    }

    fn checked_name<'a>(&self, name: &'a TranscriptName) -> Result<&'a str, StoreError> {
        if name.is_plain() {
            Ok(name.as_str())
        } else {
            Err(StoreError::InvalidName {
                name: name.to_string(),
            })
        }
    }

    /// Lists names in `dir` ending with `suffix`, stripped of it.
    async fn names_with_suffix(
        &self,
        dir: &str,
        suffix: &str,
    ) -> Result<Vec<TranscriptName>, StoreError> {
        let files = list_files(&self.root.join(dir), dir).await?.unwrap_or_default();
        Ok(files
            .iter()
            .filter_map(|f| f.strip_suffix(suffix))
            .filter_map(TranscriptName::new)
            .collect())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write_raw_transcript(&self, transcript: &RawTranscript) -> Result<(), StoreError> {
        let name = self.checked_name(&transcript.name)?;
        let file = format!("{name}.txt");
        let path = self.root.join(TRANSCRIPTS_DIR).join(&file);
        write_atomic(&path, transcript.text.as_bytes(), &file).await?;
        debug!(path = %path.display(), "Wrote raw transcript");
        Ok(())
    }

    async fn list_raw_transcripts(&self) -> Result<Vec<TranscriptName>, StoreError> {
        self.names_with_suffix(TRANSCRIPTS_DIR, ".txt").await
    }

    async fn read_raw_transcript(&self, name: &TranscriptName) -> Result<String, StoreError> {
        let file = format!("{}.txt", self.checked_name(name)?);
        read_text(&self.root.join(TRANSCRIPTS_DIR).join(&file), &file).await
    }

    async fn write_sections(
        &self,
        name: &TranscriptName,
        sections: &TranscriptSections,
    ) -> Result<(), StoreError> {
        let base = self.checked_name(name)?;
        let combined = sections.combined();
        for (suffix, text) in [
            (PREPARED_SUFFIX, sections.management.as_str()),
            (QA_SUFFIX, sections.qa.as_str()),
            (CLEANED_SUFFIX, combined.as_str()),
        ] {
            let file = format!("{base}{suffix}");
            write_atomic(&self.processed(&file), text.as_bytes(), &file).await?;
        }
        Ok(())
    }

    async fn list_processed(&self) -> Result<Vec<TranscriptName>, StoreError> {
        self.names_with_suffix(PROCESSED_DIR, PREPARED_SUFFIX).await
    }

    /// A missing Q&A file reads as an empty section.
    async fn read_sections(&self, name: &TranscriptName) -> Result<TranscriptSections, StoreError> {
        let base = self.checked_name(name)?;
        let prepared = format!("{base}{PREPARED_SUFFIX}");
        let management = read_text(&self.processed(&prepared), &prepared).await?;

        let qa_file = format!("{base}{QA_SUFFIX}");
        let qa = match read_text(&self.processed(&qa_file), &qa_file).await {
            Ok(text) => text,
            Err(e) if e.is_not_found() => String::new(),
            Err(e) => return Err(e),
        };

        Ok(TranscriptSections { management, qa })
    }

    async fn list_processed_files(&self) -> Result<Vec<String>, StoreError> {
        let files = list_files(&self.root.join(PROCESSED_DIR), PROCESSED_DIR)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                artifact: format!("{PROCESSED_DIR} directory"),
            })?;
        Ok(files.into_iter().filter(|f| f.ends_with(".txt")).collect())
    }

    async fn read_processed_file(&self, file_name: &str) -> Result<String, StoreError> {
        if !is_plain_file_name(file_name) {
            return Err(StoreError::InvalidName {
                name: file_name.to_string(),
            });
        }
        read_text(&self.processed(file_name), file_name).await
    }

    async fn write_sentiment_results(&self, records: &[SentimentRecord]) -> Result<(), StoreError> {
        write_json(&self.root.join(SENTIMENT_FILE), records, SENTIMENT_FILE).await
    }

    async fn read_sentiment_results(&self) -> Result<Vec<SentimentRecord>, StoreError> {
        read_json(&self.root.join(SENTIMENT_FILE), SENTIMENT_FILE).await
    }

    async fn write_strategic_focuses(&self, focuses: &StrategicFocuses) -> Result<(), StoreError> {
        write_json(&self.root.join(FOCUSES_FILE), focuses, FOCUSES_FILE).await
    }

    async fn read_strategic_focuses(&self) -> Result<StrategicFocuses, StoreError> {
        read_json(&self.root.join(FOCUSES_FILE), FOCUSES_FILE).await
    }

    async fn write_quarterly_shift(&self, shift: &QuarterlyShift) -> Result<(), StoreError> {
        write_json(&self.root.join(SHIFT_FILE), shift, SHIFT_FILE).await
    }

    async fn read_quarterly_shift(&self) -> Result<QuarterlyShift, StoreError> {
        read_json(&self.root.join(SHIFT_FILE), SHIFT_FILE).await
    }

    async fn write_transcript_summary(
        &self,
        name: &TranscriptName,
        summary: &str,
    ) -> Result<(), StoreError> {
        let file = format!("{}_summary.txt", self.checked_name(name)?);
        let path = self.root.join(SUMMARIES_DIR).join(&file);
        write_atomic(&path, summary.as_bytes(), &file).await
    }

    async fn write_shift_summary(&self, summary: &str) -> Result<(), StoreError> {
        let path = self.root.join(SUMMARIES_DIR).join(SHIFT_SUMMARY_FILE);
        write_atomic(&path, summary.as_bytes(), SHIFT_SUMMARY_FILE).await
    }

    async fn read_shift_summary(&self) -> Result<String, StoreError> {
        let path = self.root.join(SUMMARIES_DIR).join(SHIFT_SUMMARY_FILE);
        read_text(&path, SHIFT_SUMMARY_FILE).await
    }
}
