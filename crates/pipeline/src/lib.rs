//! Core domain for the earnings-call sentiment pipeline.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type and error type used throughout the workspace, plus the two pieces of
//! pure business logic: section scoring and quarterly aggregation.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RunId`, `TranscriptName`, `QuarterId`) |
//! | [`types`] | Value types (`ClassScores`, `SentimentRecord`, `QuarterlyShift`, etc.) |
//! | [`status`] | `PipelineStatus`, `RunState` and the `StageKind` catalogue |
//! | [`errors`] | Adapter, stage and run error types |
//! | [`ports`] | Traits implemented by infrastructure crates |
//! | [`scorer`] | Section sentiment scoring over a classifier |
//! | [`aggregator`] | Quarterly shift aggregation |
//! | [`memory`] | In-memory status and artifact stores |

pub mod aggregator;
pub mod errors;
pub mod identifiers;
pub mod memory;
pub mod ports;
pub mod scorer;
pub mod status;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use aggregator::{aggregate, ZERO_TOTAL_EPSILON};
pub use errors::{ClassifierError, FetchError, LlmError, PipelineError, StageError, StoreError};
pub use identifiers::{is_plain_file_name, QuarterId, RunId, TranscriptName};
pub use memory::{MemoryArtifactStore, MemoryStatusStore};
pub use ports::{
    ArtifactStore, ChatMessage, ChatRole, LlmProvider, SentimentClassifier, Stage, StatusStore,
    TranscriptFetcher,
};
pub use scorer::{ScoringLimits, SentimentScorer};
pub use status::{PipelineStatus, RunState, StageKind};
pub use types::{
    sort_chronologically, ClassScores, QuarterlyShift, QuarterlyShiftSeries, RawTranscript,
    Section, SectionSentiment, SentimentLabel, SentimentRecord, StrategicFocus, StrategicFocuses,
    Timestamp, TranscriptSections,
};
