use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{ArtifactStore, Stage, StageError, StageKind, TranscriptFetcher};
use tracing::{info, warn};

/// Retrieves the latest transcripts and stores them as raw transcripts.
///
/// Fetching nothing is not a failure: transcripts stored by earlier runs are
/// still processed by the later stages.
pub struct FetchStage {
    fetcher: Arc<dyn TranscriptFetcher>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl FetchStage {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { fetcher, artifacts }
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn kind(&self) -> StageKind {
        StageKind::Fetch
    }

    async fn run(&self) -> Result<(), StageError> {
        let transcripts = self.fetcher.fetch_latest().await?;
        if transcripts.is_empty() {
            warn!("No transcripts fetched; continuing with previously stored transcripts");
        }

        for transcript in &transcripts {
            self.artifacts.write_raw_transcript(transcript).await?;
            info!(transcript = %transcript.name, bytes = transcript.text.len(), "Stored raw transcript");
        }

        Ok(())
    }
}
