//! Filter, search and sort handlers. Each returns the refreshed preview.

use axum::{
    Json,
    extract::{Path, State},
};
use dataeater::Rule;
use dataeater::store::Preview;
use serde::Deserialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// PUT /api/view/rules
pub async fn put_rules(
    State(state): State<AppState>,
    Json(rules): Json<Vec<Rule>>,
) -> Result<Json<Preview>, ApiError> {
    state
        .with_store(move |store| {
            store.set_rules(rules);
            Ok(Json(store.preview().clone()))
        })
        .await
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub search: Option<String>,
}

/// PUT /api/view/search
pub async fn put_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Preview>, ApiError> {
    state
        .with_store(move |store| {
            store.set_search(req.search);
            Ok(Json(store.preview().clone()))
        })
        .await
}

/// POST /api/view/sort/:column
pub async fn post_sort(
    State(state): State<AppState>,
    Path(column): Path<String>,
) -> Result<Json<Preview>, ApiError> {
    state
        .with_store(move |store| {
            store.toggle_sort(&column)?;
            Ok(Json(store.preview().clone()))
        })
        .await
}

/// DELETE /api/view
pub async fn clear_view(State(state): State<AppState>) -> Result<Json<Preview>, ApiError> {
    state
        .with_store(|store| {
            store.clear_view();
            Ok(Json(store.preview().clone()))
        })
        .await
}
