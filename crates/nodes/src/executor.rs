//! The pipeline executor: runs the six stages in order and narrates progress
//! into the [`StatusStore`].
//!
//! ## Lifecycle
//!
//! ```text
//! idle ──trigger──▶ running ──all stages ok──▶ done
//!                      │
//!                      └──any stage fails──▶ error
//! ```
//!
//! A trigger takes the single run slot, records `running` before returning,
//! and hands the run to a spawned task. The task owns the slot until the run
//! ends. A stage failure, including a panic inside a stage, ends the run with
//! an `error` status and is returned from [`RunTicket::wait`]; it never
//! escapes the task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use pipeline::{
    PipelineError, PipelineStatus, RunId, Stage, StageError, StageKind, StatusStore, StoreError,
    Timestamp,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::guard::{RunGuard, RunPermit};
use crate::stages::PipelineStages;

/// Why a trigger was not accepted.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Another run holds the run slot.
    #[error("a pipeline run is already in progress")]
    AlreadyRunning,

    /// The `running` status could not be recorded, so the run was not started.
    #[error("could not record pipeline status: {0}")]
    Status(#[source] StoreError),
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub stages: Vec<StageKind>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

/// Acknowledgment of an accepted trigger.
///
/// Dropping the ticket detaches from the run; it keeps going.
#[derive(Debug)]
pub struct RunTicket {
    pub run_id: RunId,
    pub accepted_at: Timestamp,
    handle: JoinHandle<Result<RunReport, PipelineError>>,
}

impl RunTicket {
    /// Waits for the run to finish and returns its outcome.
    pub async fn wait(self) -> Result<RunReport, PipelineError> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PipelineError::Aborted {
                message: e.to_string(),
            }),
        }
    }
}

/// Sequences the pipeline stages and owns the run slot.
pub struct PipelineExecutor {
    stages: PipelineStages,
    status: Arc<dyn StatusStore>,
    guard: RunGuard,
}

impl PipelineExecutor {
    pub fn new(stages: PipelineStages, status: Arc<dyn StatusStore>) -> Self {
        Self {
            stages,
            status,
            guard: RunGuard::new(),
        }
    }

    /// The status store this executor reports into.
    pub fn status_store(&self) -> Arc<dyn StatusStore> {
        Arc::clone(&self.status)
    }

    /// Returns `true` while a run holds the slot.
    pub fn is_running(&self) -> bool {
        self.guard.is_busy()
    }

    /// Accepts a run and starts it in the background.
    ///
    /// On return the status already reads `running`. Fails with
    /// [`TriggerError::AlreadyRunning`] without touching the status when a run
    /// is in flight.
    pub async fn trigger(self: &Arc<Self>) -> Result<RunTicket, TriggerError> {
        let permit = self
            .guard
            .try_acquire()
            .ok_or(TriggerError::AlreadyRunning)?;

        self.status
            .set(PipelineStatus::running(PipelineStatus::REQUESTED_MESSAGE))
            .await
            .map_err(TriggerError::Status)?;

        let run_id = RunId::new_random();
        let executor = Arc::clone(self);
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        let handle = tokio::spawn(
            async move { executor.run_with_permit(permit, run_id).await }.instrument(span),
        );

        info!(run_id = %run_id, "Pipeline run accepted");

        Ok(RunTicket {
            run_id,
            accepted_at: Timestamp::now(),
            handle,
        })
    }

    async fn run_with_permit(
        &self,
        _permit: RunPermit,
        run_id: RunId,
    ) -> Result<RunReport, PipelineError> {
        let outcome = self.run(run_id).await;
        match &outcome {
            Ok(report) => info!(
                run_id = %run_id,
                stages = report.stages.len(),
                "Background pipeline run completed"
            ),
            Err(e) => warn!(run_id = %run_id, error = %e, "Background pipeline run ended with an error"),
        }
        outcome
    }

    /// Runs every stage in order, publishing progress. Only reachable through
    /// [`PipelineExecutor::trigger`], which holds the run slot.
    async fn run(&self, run_id: RunId) -> Result<RunReport, PipelineError> {
        let started_at = Timestamp::now();
        self.publish(PipelineStatus::running(PipelineStatus::STARTED_MESSAGE))
            .await;

        let mut completed = Vec::with_capacity(StageKind::ORDER.len());
        for stage in self.stages.in_order() {
            let kind = stage.kind();
            self.publish(PipelineStatus::running(kind.status_message()))
                .await;

            info!(run_id = %run_id, stage = %kind, "Stage started");
            let began = Instant::now();

            if let Err(source) = run_isolated(stage.as_ref()).await {
                let err = PipelineError::StageFailed {
                    stage: kind,
                    source,
                };
                error!(run_id = %run_id, stage = %kind, error = %err, "Pipeline run failed");
                self.publish_terminal(PipelineStatus::failed(&err)).await;
                return Err(err);
            }

            info!(
                run_id = %run_id,
                stage = %kind,
                elapsed_ms = began.elapsed().as_millis() as u64,
                "Stage completed"
            );
            completed.push(kind);
        }

        self.publish_terminal(PipelineStatus::done()).await;
        info!(run_id = %run_id, "Pipeline run completed");

        Ok(RunReport {
            run_id,
            stages: completed,
            started_at,
            finished_at: Timestamp::now(),
        })
    }

    /// Records a progress update. A failed write does not stop the run.
    async fn publish(&self, status: PipelineStatus) {
        if let Err(e) = self.status.set(status).await {
            warn!(error = %e, "Failed to record pipeline progress");
        }
    }

    async fn publish_terminal(&self, status: PipelineStatus) {
        let state = status.state;
        if let Err(e) = self.status.set(status).await {
            error!(state = %state, error = %e, "Failed to record terminal pipeline status");
        }
    }
}

/// Runs one stage, converting a panic into [`StageError::Panicked`].
async fn run_isolated(stage: &dyn Stage) -> Result<(), StageError> {
    match AssertUnwindSafe(stage.run()).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(StageError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
