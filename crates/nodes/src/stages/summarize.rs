use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    ArtifactStore, ChatMessage, LlmProvider, QuarterlyShift, QuarterlyShiftSeries, Stage,
    StageError, StageKind,
};
use tracing::info;

const ANALYST_PROMPT: &str = "You are an expert financial analyst. \
You analyze sentiment trends from earnings call data across quarters. \
Given structured sentiment scores for management remarks and Q&A, \
write a concise, plain-English summary of the key trends. \
Highlight changes in overall sentiment, notable improvements or \
deteriorations, and any divergence between management and Q&A. \
Keep the summary under 250 words and avoid repeating the raw numbers.";

/// Writes a narrative summary of the quarterly shift.
pub struct SummarizeStage {
    llm: Arc<dyn LlmProvider>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl SummarizeStage {
    pub fn new(llm: Arc<dyn LlmProvider>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { llm, artifacts }
    }
}

#[async_trait]
impl Stage for SummarizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Summarize
    }

    async fn run(&self) -> Result<(), StageError> {
        let shift = self.artifacts.read_quarterly_shift().await?;
        let user = format!(
            "Here is the structured sentiment data across quarters. \
             Please summarize the key cross-quarter sentiment shifts.\n\n{}",
            build_summary_prompt(&shift)
        );

        let reply = self
            .llm
            .chat(&[ChatMessage::system(ANALYST_PROMPT), ChatMessage::user(user)])
            .await?;
        let summary = reply.trim();
        self.artifacts.write_shift_summary(summary).await?;

        info!(chars = summary.len(), "Wrote quarterly shift summary");
        Ok(())
    }
}

/// Renders the shift series as the compact text block the model reads.
pub fn build_summary_prompt(shift: &QuarterlyShift) -> String {
    [
        section_lines("Management sentiment by quarter:", &shift.management),
        section_lines("Q&A sentiment by quarter:", &shift.qa),
    ]
    .join("\n\n")
}

fn section_lines(heading: &str, series: &QuarterlyShiftSeries) -> String {
    let mut lines = vec![heading.to_string()];
    let values = series
        .positive
        .iter()
        .zip(&series.neutral)
        .zip(&series.negative)
        .zip(&series.net_sentiment);
    for (quarter, (((positive, neutral), negative), net)) in series.quarters.iter().zip(values) {
        lines.push(format!(
            "  {quarter}: positive={positive:.3} neutral={neutral:.3} negative={negative:.3} net={net:.3}"
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::QuarterId;

    #[test]
    fn prompt_lists_every_quarter_per_section() {
        let series = QuarterlyShiftSeries {
            quarters: vec![QuarterId::new("Q1_2024"), QuarterId::new("Q2_2024")],
            positive: vec![0.6, 0.25],
            neutral: vec![0.3, 0.5],
            negative: vec![0.1, 0.25],
            net_sentiment: vec![0.5, 0.0],
        };
        let shift = QuarterlyShift {
            management: series.clone(),
            qa: series,
        };

        let prompt = build_summary_prompt(&shift);

        assert!(prompt.starts_with("Management sentiment by quarter:\n"));
        assert!(prompt.contains("\n\nQ&A sentiment by quarter:\n"));
        assert!(prompt
            .contains("  Q1_2024: positive=0.600 neutral=0.300 negative=0.100 net=0.500"));
        assert_eq!(prompt.matches("Q2_2024").count(), 2);
    }

    #[test]
    fn empty_shift_still_has_headings() {
        let prompt = build_summary_prompt(&QuarterlyShift::default());
        assert_eq!(
            prompt,
            "Management sentiment by quarter:\n\nQ&A sentiment by quarter:"
        );
    }
}
