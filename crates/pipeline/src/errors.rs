//! Error types for the sentiment pipeline domain.
//!
//! Adapter failures ([`ClassifierError`], [`LlmError`], [`FetchError`],
//! [`StoreError`]) are defined here so the port traits in [`crate::ports`] can
//! name them without the domain depending on any transport crate. Adapters
//! flatten their transport errors into the string payloads.
//!
//! [`StageError`] is what a stage returns; [`PipelineError`] is what a run
//! returns. Neither ever propagates past the executor's background task.

use thiserror::Error;

use crate::StageKind;

// ---------------------------------------------------------------------------
// Adapter errors
// ---------------------------------------------------------------------------

/// Failure of one sentiment classifier call.
///
/// Always chunk-local: the scorer skips the chunk and carries on.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The request could not be sent or the connection failed.
    #[error("classifier request failed: {message}")]
    Transport { message: String },

    /// The service answered with a non-success HTTP status.
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("classifier response could not be interpreted: {message}")]
    InvalidResponse { message: String },

    /// The response parsed but is not a probability distribution.
    #[error(
        "classifier returned an invalid distribution \
         (positive {positive}, neutral {neutral}, negative {negative})"
    )]
    InvalidDistribution {
        positive: f64,
        neutral: f64,
        negative: f64,
    },
}

/// Failure of one chat language model call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model request failed: {message}")]
    Transport { message: String },

    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language model returned an empty reply")]
    EmptyReply,
}

/// Failure while retrieving transcripts from their source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A retrieved page yielded no usable transcript name.
    #[error("cannot derive a transcript name from {url}")]
    UnnamedTranscript { url: String },
}

/// Failure reading or writing a persisted artifact or the status record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The artifact has not been produced yet.
    #[error("{artifact} not found")]
    NotFound { artifact: String },

    /// The requested name is not a plain file name.
    #[error("invalid artifact name '{name}'")]
    InvalidName { name: String },

    #[error("I/O error on {artifact}: {source}")]
    Io {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    /// The artifact exists but does not parse.
    #[error("{artifact} is corrupted: {source}")]
    Corrupt {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    /// Another process owns the status record, so a run may be in flight there.
    #[error("{artifact} is held by another process; a pipeline run may already be in progress")]
    Locked { artifact: String },
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Stage and run errors
// ---------------------------------------------------------------------------

/// Failure of one pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The stage has nothing to work on.
    #[error("no input: {what}")]
    NoInput { what: String },

    /// The stage panicked; the payload message is preserved when it is a string.
    #[error("stage panicked: {message}")]
    Panicked { message: String },
}

/// Failure of a whole run: the first stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: StageKind,
        #[source]
        source: StageError,
    },

    /// The run task ended without producing an outcome.
    #[error("run task aborted: {message}")]
    Aborted { message: String },
}

impl PipelineError {
    /// The stage that stopped the run, when a stage did.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            Self::Aborted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_display_names_stage_and_cause() {
        let err = PipelineError::StageFailed {
            stage: StageKind::Aggregate,
            source: StageError::Store(StoreError::NotFound {
                artifact: "sentiment_results.json".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "stage 'aggregate' failed: sentiment_results.json not found"
        );
        assert_eq!(err.stage(), Some(StageKind::Aggregate));
    }
}
