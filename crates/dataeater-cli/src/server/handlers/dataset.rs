//! Read-only dataset handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use dataeater::store::{LoadedSource, Preview, StoreStatus};
use dataeater::{Column, ColumnStats, HealthReport, HistoryEntry};
use serde::Serialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for the dataset endpoint.
#[derive(Serialize)]
pub struct DatasetResponse {
    pub source: Option<LoadedSource>,
    pub columns: Vec<Column>,
    pub row_count: u64,
    pub unsaved_changes: bool,
}

/// GET /api/dataset
pub async fn get_dataset(State(state): State<AppState>) -> Result<Json<DatasetResponse>, ApiError> {
    state
        .with_store(|store| {
            Ok(Json(DatasetResponse {
                source: store.source().cloned(),
                columns: store.columns().to_vec(),
                row_count: store.row_count(),
                unsaved_changes: store.has_unsaved_changes(),
            }))
        })
        .await
}

/// GET /api/preview
pub async fn get_preview(State(state): State<AppState>) -> Result<Json<Preview>, ApiError> {
    state
        .with_store(|store| Ok(Json(store.preview().clone())))
        .await
}

/// GET /api/health
pub async fn get_health(State(state): State<AppState>) -> Result<Json<HealthReport>, ApiError> {
    state
        .with_store(|store| Ok(Json(store.health_report()?)))
        .await
}

/// GET /api/history
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    state
        .with_store(|store| Ok(Json(store.history().entries().to_vec())))
        .await
}

/// Status plus whether a mutation is running.
#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: StoreStatus,
    pub busy: bool,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let busy = state.is_busy();
    state
        .with_store(move |store| {
            Ok(Json(StatusResponse {
                status: store.status(),
                busy,
            }))
        })
        .await
}

/// POST /api/columns/:name/select
pub async fn select_column(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Option<ColumnStats>>, ApiError> {
    state
        .with_store(move |store| Ok(Json(store.select_column(Some(&name))?.cloned())))
        .await
}

/// DELETE /api/columns/selection
pub async fn clear_selection(State(state): State<AppState>) -> Result<Json<()>, ApiError> {
    state
        .with_store(|store| {
            store.select_column(None)?;
            Ok(Json(()))
        })
        .await
}
