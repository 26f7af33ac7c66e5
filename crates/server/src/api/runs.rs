//! Pipeline status polling and the run trigger.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use pipeline::{PipelineStatus, RunId};
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub run_id: RunId,
}

/// GET /pipeline/status
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<PipelineStatus>> {
    Ok(Json(state.executor.status_store().get().await?))
}

/// POST /pipeline/refresh
///
/// Accepts a run and returns at once; progress is read from
/// `/pipeline/status`. 409 while another run is in flight.
pub async fn refresh(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<RefreshResponse>)> {
    let ticket = state.executor.trigger().await?;
    info!(run_id = %ticket.run_id, "Pipeline refresh requested");
    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            status: "started",
            run_id: ticket.run_id,
        }),
    ))
}

pub fn pipeline_routes() -> Router<AppState> {
    Router::new()
        .route("/pipeline/status", get(get_status))
        .route("/pipeline/refresh", post(refresh))
}
