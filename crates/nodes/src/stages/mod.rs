//! The six pipeline stages.
//!
//! Each stage is a thin sequence of calls between the [`ArtifactStore`] and
//! one external collaborator (or the domain logic in the `pipeline` crate).
//! Stages contain no status reporting; the executor owns that.

mod aggregate;
mod fetch;
mod preprocess;
mod score;
mod summarize;
mod themes;

use std::sync::Arc;

use pipeline::{ArtifactStore, LlmProvider, SentimentScorer, Stage, TranscriptFetcher};

pub use aggregate::AggregateStage;
pub use fetch::FetchStage;
pub use preprocess::{PreprocessRules, PreprocessStage, TranscriptCleaner};
pub use score::ScoreStage;
pub use summarize::{build_summary_prompt, SummarizeStage};
pub use themes::{parse_focuses, ThemeStage};

/// Collaborators the standard stages are built from.
#[derive(Clone)]
pub struct StageDependencies {
    pub artifacts: Arc<dyn ArtifactStore>,
    pub fetcher: Arc<dyn TranscriptFetcher>,
    pub scorer: SentimentScorer,
    pub llm: Arc<dyn LlmProvider>,
    pub preprocess: PreprocessRules,
    /// Company name used in prompts.
    pub company: String,
    /// Transcripts scored concurrently in the score stage.
    pub score_concurrency: usize,
}

/// One stage per slot of the fixed sequence.
///
/// The order is a property of this type, not of the caller: whatever fills the
/// slots, [`PipelineStages::in_order`] always yields fetch, preprocess, score,
/// themes, aggregate, summarize.
#[derive(Clone)]
pub struct PipelineStages {
    pub fetch: Arc<dyn Stage>,
    pub preprocess: Arc<dyn Stage>,
    pub score: Arc<dyn Stage>,
    pub themes: Arc<dyn Stage>,
    pub aggregate: Arc<dyn Stage>,
    pub summarize: Arc<dyn Stage>,
}

impl PipelineStages {
    /// The production stages.
    pub fn standard(deps: StageDependencies) -> Self {
        Self {
            fetch: Arc::new(FetchStage::new(
                Arc::clone(&deps.fetcher),
                Arc::clone(&deps.artifacts),
            )),
            preprocess: Arc::new(PreprocessStage::new(
                Arc::clone(&deps.artifacts),
                TranscriptCleaner::new(deps.preprocess.clone()),
            )),
            score: Arc::new(ScoreStage::new(
                deps.scorer.clone(),
                Arc::clone(&deps.artifacts),
                deps.score_concurrency,
            )),
            themes: Arc::new(ThemeStage::new(
                Arc::clone(&deps.llm),
                Arc::clone(&deps.artifacts),
                deps.company.clone(),
            )),
            aggregate: Arc::new(AggregateStage::new(Arc::clone(&deps.artifacts))),
            summarize: Arc::new(SummarizeStage::new(
                Arc::clone(&deps.llm),
                Arc::clone(&deps.artifacts),
            )),
        }
    }

    /// The stages in execution order.
    pub fn in_order(&self) -> [Arc<dyn Stage>; 6] {
        [
            Arc::clone(&self.fetch),
            Arc::clone(&self.preprocess),
            Arc::clone(&self.score),
            Arc::clone(&self.themes),
            Arc::clone(&self.aggregate),
            Arc::clone(&self.summarize),
        ]
    }
}
