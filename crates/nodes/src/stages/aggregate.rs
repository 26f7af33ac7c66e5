use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{aggregate, ArtifactStore, Stage, StageError, StageKind};
use tracing::info;

/// Turns the sentiment results into the quarterly shift series.
pub struct AggregateStage {
    artifacts: Arc<dyn ArtifactStore>,
}

impl AggregateStage {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl Stage for AggregateStage {
    fn kind(&self) -> StageKind {
        StageKind::Aggregate
    }

    async fn run(&self) -> Result<(), StageError> {
        let records = self.artifacts.read_sentiment_results().await?;
        let shift = aggregate(&records);
        self.artifacts.write_quarterly_shift(&shift).await?;
        info!(quarters = shift.management.len(), "Wrote quarterly shift");
        Ok(())
    }
}
