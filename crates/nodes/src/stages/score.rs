use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use pipeline::{
    sort_chronologically, ArtifactStore, QuarterId, SentimentRecord, SentimentScorer, Stage,
    StageError, StageKind, TranscriptName,
};
use tracing::{debug, info};

/// Scores the management and Q&A sections of every processed transcript.
pub struct ScoreStage {
    scorer: SentimentScorer,
    artifacts: Arc<dyn ArtifactStore>,
    concurrency: usize,
}

impl ScoreStage {
    pub fn new(scorer: SentimentScorer, artifacts: Arc<dyn ArtifactStore>, concurrency: usize) -> Self {
        Self {
            scorer,
            artifacts,
            concurrency: concurrency.max(1),
        }
    }

    async fn score_transcript(&self, name: TranscriptName) -> Result<SentimentRecord, StageError> {
        let sections = self.artifacts.read_sections(&name).await?;
        let management = self.scorer.score(&sections.management).await;
        let qa = self.scorer.score(&sections.qa).await;
        let quarter = QuarterId::from_file_stem(name.as_str());

        debug!(
            transcript = %name,
            quarter = %quarter,
            management = %management.label,
            qa = %qa.label,
            "Scored transcript"
        );

        Ok(SentimentRecord::new(name, quarter, management, qa))
    }
}

#[async_trait]
impl Stage for ScoreStage {
    fn kind(&self) -> StageKind {
        StageKind::Score
    }

    async fn run(&self) -> Result<(), StageError> {
        let names = self.artifacts.list_processed().await?;
        if names.is_empty() {
            return Err(StageError::NoInput {
                what: "no processed transcripts to score".to_string(),
            });
        }

        // `buffered` keeps input order, so the pre-sort order is the listing order.
        let mut records: Vec<SentimentRecord> = stream::iter(names)
            .map(|name| self.score_transcript(name))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        sort_chronologically(&mut records);
        self.artifacts.write_sentiment_results(&records).await?;

        info!(records = records.len(), "Wrote sentiment results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{
        ClassScores, ClassifierError, MemoryArtifactStore, ScoringLimits, SentimentClassifier,
        SentimentLabel, TranscriptSections,
    };

    struct UpbeatClassifier;

    #[async_trait]
    impl SentimentClassifier for UpbeatClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassScores, ClassifierError> {
            Ok(ClassScores::new(0.7, 0.2, 0.1))
        }
    }

    fn stage(artifacts: Arc<MemoryArtifactStore>) -> ScoreStage {
        let scorer = SentimentScorer::new(Arc::new(UpbeatClassifier), ScoringLimits::default());
        ScoreStage::new(scorer, artifacts, 4)
    }

    async fn store_sections(artifacts: &MemoryArtifactStore, name: &str, management: &str, qa: &str) {
        artifacts
            .write_sections(
                &TranscriptName::new(name).unwrap(),
                &TranscriptSections {
                    management: management.to_string(),
                    qa: qa.to_string(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fails_without_processed_transcripts() {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let err = stage(artifacts).run().await.unwrap_err();
        assert!(matches!(err, StageError::NoInput { .. }));
    }

    #[tokio::test]
    async fn writes_records_in_chronological_order() {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        store_sections(&artifacts, "nvda-q3-2024", "Great quarter.", "Strong demand.").await;
        store_sections(&artifacts, "nvda-q1-2025", "Records again.", "").await;
        store_sections(&artifacts, "nvda-q1-2024", "Solid growth.", "Good questions.").await;

        stage(Arc::clone(&artifacts)).run().await.unwrap();

        let records = artifacts.read_sentiment_results().await.unwrap();
        let quarters: Vec<_> = records.iter().map(|r| r.quarter.as_str()).collect();
        assert_eq!(quarters, vec!["Q1_2024", "Q3_2024", "Q1_2025"]);

        let latest = &records[2];
        assert_eq!(latest.management_sentiment, SentimentLabel::Positive);
        assert_eq!(latest.qa_sentiment, SentimentLabel::NotAvailable);
        assert!(latest.qa_scores.is_zero());
    }
}
