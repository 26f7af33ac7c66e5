//! Earnings Pulse pipeline stages and the executor that runs them.
//!
//! This crate provides the six stage implementations (fetch through
//! summarize), the single-slot [`RunGuard`] that admits one run at a time,
//! and the [`PipelineExecutor`] that sequences the stages and narrates
//! progress into the status store.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls between domain logic in the
//! [`pipeline`] crate and the port traits (artifact store, transcript fetcher,
//! sentiment classifier, language model). They contain no scoring or
//! aggregation rules of their own.

pub mod executor;
pub mod guard;
pub mod stages;

pub use executor::{PipelineExecutor, RunReport, RunTicket, TriggerError};
pub use guard::{RunGuard, RunPermit};
pub use stages::{
    build_summary_prompt, parse_focuses, AggregateStage, FetchStage, PipelineStages,
    PreprocessRules, PreprocessStage, ScoreStage, StageDependencies, SummarizeStage,
    ThemeStage, TranscriptCleaner,
};
