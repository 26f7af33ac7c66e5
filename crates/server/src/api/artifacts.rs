//! Read-only endpoints over the pipeline's artifacts.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use pipeline::{is_plain_file_name, QuarterlyShift, SentimentRecord, StrategicFocuses};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const SHIFT_SUMMARY_FILE: &str = "quarterly_shift_summary.txt";

#[derive(Debug, Serialize)]
pub struct TranscriptEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
}

/// GET /transcripts
///
/// Every processed text file with the path it can be read from.
pub async fn list_transcripts(State(state): State<AppState>) -> ApiResult<Json<Vec<TranscriptEntry>>> {
    let files = state.artifacts.list_processed_files().await?;
    Ok(Json(
        files
            .into_iter()
            .map(|name| TranscriptEntry {
                path: format!("/transcript/{name}"),
                name,
            })
            .collect(),
    ))
}

/// GET /transcript/:filename
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<FileContent>> {
    if !is_plain_file_name(&filename) {
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }
    let content = state
        .artifacts
        .read_processed_file(&filename)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ApiError::NotFound("Transcript not found".to_string())
            } else {
                e.into()
            }
        })?;
    Ok(Json(FileContent { filename, content }))
}

/// GET /sentiment
pub async fn get_sentiment(State(state): State<AppState>) -> ApiResult<Json<Vec<SentimentRecord>>> {
    Ok(Json(state.artifacts.read_sentiment_results().await?))
}

/// GET /strategic_focuses
pub async fn get_strategic_focuses(State(state): State<AppState>) -> ApiResult<Json<StrategicFocuses>> {
    Ok(Json(state.artifacts.read_strategic_focuses().await?))
}

/// GET /quarterly_shift
pub async fn get_quarterly_shift(State(state): State<AppState>) -> ApiResult<Json<QuarterlyShift>> {
    Ok(Json(state.artifacts.read_quarterly_shift().await?))
}

/// GET /summaries/quarterly_shift
pub async fn get_quarterly_shift_summary(State(state): State<AppState>) -> ApiResult<Json<FileContent>> {
    let content = state.artifacts.read_shift_summary().await?;
    Ok(Json(FileContent {
        filename: SHIFT_SUMMARY_FILE.to_string(),
        content,
    }))
}

pub fn artifact_routes() -> Router<AppState> {
    Router::new()
        .route("/transcripts", get(list_transcripts))
        .route("/transcript/:filename", get(get_transcript))
        .route("/sentiment", get(get_sentiment))
        .route("/strategic_focuses", get(get_strategic_focuses))
        .route("/quarterly_shift", get(get_quarterly_shift))
        .route("/summaries/quarterly_shift", get(get_quarterly_shift_summary))
}
