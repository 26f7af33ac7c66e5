//! Pipeline progress record and the stage catalogue it narrates.
//!
//! [`PipelineStatus`] is the only channel through which a running pipeline
//! reports progress. Its lifecycle is `idle → running → {done | error}`; the
//! executor in the `nodes` crate is the only writer while a run is in flight.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run has been recorded.
    Idle,
    /// A run has been accepted and has not reached a terminal state.
    Running,
    /// The last run completed every stage.
    Done,
    /// The last run stopped at a failing stage.
    Error,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// The persisted progress record polled by observers.
///
/// Serialized as `{"state": ..., "message": ...}`; `updated_at` is added when
/// known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub state: RunState,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl PipelineStatus {
    /// Message reported when no status has ever been recorded.
    pub const NEVER_RUN_MESSAGE: &'static str = "Pipeline has not been run yet.";

    /// Message written when a trigger is accepted, before the run task starts.
    pub const REQUESTED_MESSAGE: &'static str = "Pipeline requested. Waiting to start…";

    /// Message written when the run task begins.
    pub const STARTED_MESSAGE: &'static str = "Pipeline started. Fetching latest transcripts...";

    /// Message written after the last stage succeeds.
    pub const COMPLETED_MESSAGE: &'static str =
        "Pipeline completed successfully. Reload data to see updated results.";

    /// Message written when a persisted `running` record is found at startup.
    pub const INTERRUPTED_MESSAGE: &'static str =
        "Pipeline failed: the previous run was interrupted by a service restart.";

    fn with_state(state: RunState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            updated_at: Some(Timestamp::now()),
        }
    }

    /// The default record reported before the first run.
    pub fn idle() -> Self {
        Self {
            state: RunState::Idle,
            message: Self::NEVER_RUN_MESSAGE.to_string(),
            updated_at: None,
        }
    }

    /// A progress update.
    pub fn running(message: impl Into<String>) -> Self {
        Self::with_state(RunState::Running, message)
    }

    /// The terminal success record.
    pub fn done() -> Self {
        Self::with_state(RunState::Done, Self::COMPLETED_MESSAGE)
    }

    /// The terminal failure record, embedding the error description.
    pub fn failed(description: impl std::fmt::Display) -> Self {
        Self::with_state(RunState::Error, format!("Pipeline failed: {description}"))
    }

    /// The record replacing a `running` status left behind by a stopped process.
    pub fn interrupted() -> Self {
        Self::with_state(RunState::Error, Self::INTERRUPTED_MESSAGE)
    }

    /// Returns `true` while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self::idle()
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The six stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Fetch,
    Preprocess,
    Score,
    Themes,
    Aggregate,
    Summarize,
}

impl StageKind {
    /// Every stage in the fixed execution order.
    pub const ORDER: [StageKind; 6] = [
        StageKind::Fetch,
        StageKind::Preprocess,
        StageKind::Score,
        StageKind::Themes,
        StageKind::Aggregate,
        StageKind::Summarize,
    ];

    /// Short machine name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Preprocess => "preprocess",
            Self::Score => "score",
            Self::Themes => "themes",
            Self::Aggregate => "aggregate",
            Self::Summarize => "summarize",
        }
    }

    /// Progress message published when the stage starts.
    pub fn status_message(self) -> &'static str {
        match self {
            Self::Fetch => "Fetching latest earnings call transcripts...",
            Self::Preprocess => {
                "Preprocessing transcripts (cleaning, splitting management/Q&A)..."
            }
            Self::Score => "Analyzing sentiment across all quarters...",
            Self::Themes => "Extracting strategic focuses...",
            Self::Aggregate => "Building quarterly cross-call sentiment shift data...",
            Self::Summarize => "Summarizing quarterly sentiment shifts...",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
