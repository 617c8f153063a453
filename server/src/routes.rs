use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use host_agent_types::{
    BackupReport, GetFilesRequest, GetFilesResult, HealthStatus, SearchRequest, SearchResult,
};

use crate::{ApiError, AppState};

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

#[tracing::instrument(name = "search", skip_all)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(request) = payload?;
    let query = request.validate()?;
    let result = state.search.search(&query).await?;
    Ok(Json(result))
}

#[tracing::instrument(name = "get_files", skip_all)]
pub async fn get_files(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GetFilesRequest>, JsonRejection>,
) -> Result<Json<GetFilesResult>, ApiError> {
    let Json(request) = payload?;
    let directory = request.validate()?;
    let files = request.files;

    let result = tokio::task::spawn_blocking(move || state.files.get_files(directory, &files))
        .await
        .map_err(|e| ApiError::Internal(format!("file retrieval task failed: {e}")))??;
    Ok(Json(result))
}

#[tracing::instrument(name = "backup_n8n", skip_all)]
pub async fn backup_n8n(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BackupReport>, ApiError> {
    tracing::info!("Starting N8N backup process");
    let report = state.backup.run().await?;
    Ok(Json(report))
}
