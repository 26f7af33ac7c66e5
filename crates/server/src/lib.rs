//! Earnings Pulse HTTP API.
//!
//! Serves the pipeline's artifacts to a dashboard, reports pipeline progress
//! and accepts run triggers.
//!
//! ## Architectural Layer
//!
//! **Infrastructure (inbound).** Routing, request decoding and error rendering
//! live here. Runs are delegated to [`nodes::PipelineExecutor`]; artifact
//! reads go through [`pipeline::ArtifactStore`].
//!
//! ## Routes
//!
//! | Method & path | Response |
//! |---------------|----------|
//! | `GET /health` | `{status, version, uptime_seconds}` |
//! | `GET /transcripts` | processed text files as `{name, path}` |
//! | `GET /transcript/:filename` | `{filename, content}` |
//! | `GET /sentiment` | sentiment results |
//! | `GET /strategic_focuses` | strategic focuses |
//! | `GET /quarterly_shift` | quarterly shift series |
//! | `GET /summaries/quarterly_shift` | `{filename, content}` |
//! | `GET /pipeline/status` | status record |
//! | `POST /pipeline/refresh` | `202 {status: "started", run_id}`, or 409 |

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use nodes::PipelineExecutor;
use pipeline::ArtifactStore;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<PipelineExecutor>,
    pub artifacts: Arc<dyn ArtifactStore>,
    /// For uptime reporting.
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(executor: Arc<PipelineExecutor>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            executor,
            artifacts,
            startup_time: Utc::now(),
        }
    }
}

/// Builds the application router with CORS open to any origin and request
/// tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::health_routes())
        .merge(api::artifact_routes())
        .merge(api::pipeline_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP API listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
