//! Saved filter favorites.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use dataeater::store::Preview;
use dataeater::{Favorite, FavoriteStore, Rule};
use serde::Deserialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

fn with_favorites<T>(
    state: &AppState,
    f: impl FnOnce(&mut FavoriteStore) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let favorites = Arc::clone(&state.favorites);
    let mut favorites = favorites
        .lock()
        .map_err(|_| ApiError::Internal("favorites lock poisoned".to_string()))?;
    f(&mut favorites)
}

/// GET /api/favorites
pub async fn list_favorites(State(state): State<AppState>) -> Result<Json<Vec<Favorite>>, ApiError> {
    with_favorites(&state, |favorites| Ok(Json(favorites.list().to_vec())))
}

/// Request body for saving the current or given rules.
#[derive(Deserialize)]
pub struct CreateFavoriteRequest {
    pub name: String,
    /// Rules to save; the current view's rules when omitted.
    pub rules: Option<Vec<Rule>>,
}

/// POST /api/favorites
pub async fn create_favorite(
    State(state): State<AppState>,
    Json(req): Json<CreateFavoriteRequest>,
) -> Result<Json<Favorite>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("favorite name must not be empty".to_string()));
    }
    let rules = match req.rules {
        Some(rules) => rules,
        None => state.with_store(|store| Ok(store.view().rules.clone())).await?,
    };

    with_favorites(&state, |favorites| {
        Ok(Json(favorites.add(req.name, rules)?.clone()))
    })
}

/// DELETE /api/favorites/:id
pub async fn delete_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<()>, ApiError> {
    with_favorites(&state, |favorites| {
        if favorites.remove(&id)? {
            Ok(Json(()))
        } else {
            Err(ApiError::NotFound(format!("Favorite not found: {}", id)))
        }
    })
}

/// Request body for applying a favorite.
#[derive(Deserialize, Default)]
pub struct ApplyFavoriteRequest {
    /// Target column per rule id, for rules whose column was cleared.
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

/// POST /api/favorites/:id/apply
///
/// Rules without a target column stay in the view but do not filter until
/// one is assigned.
pub async fn apply_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ApplyFavoriteRequest>>,
) -> Result<Json<Preview>, ApiError> {
    let Json(req) = body.unwrap_or_default();
    let mut rules = with_favorites(&state, |favorites| {
        favorites
            .get(&id)
            .map(|f| f.rules.clone())
            .ok_or_else(|| ApiError::NotFound(format!("Favorite not found: {}", id)))
    })?;
    for rule in &mut rules {
        if let Some(column) = req.columns.get(&rule.id) {
            rule.column = column.clone();
        }
    }

    state
        .with_store(move |store| {
            store.set_rules(rules);
            Ok(Json(store.preview().clone()))
        })
        .await
}
