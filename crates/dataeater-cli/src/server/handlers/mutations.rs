//! Mutation, query and cancellation handlers.

use axum::{Json, extract::State};
use dataeater::{HistoryKind, QueryResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for a mutation: one statement, or several run atomically.
#[derive(Deserialize)]
pub struct MutationRequest {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub statements: Vec<String>,
    pub description: Option<String>,
    pub kind: Option<HistoryKind>,
}

/// Dataset shape after a successful mutation.
#[derive(Serialize)]
pub struct MutationResponse {
    pub row_count: u64,
    pub column_count: usize,
    pub history_len: usize,
}

/// POST /api/mutations
pub async fn post_mutation(
    State(state): State<AppState>,
    Json(req): Json<MutationRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let kind = req.kind.unwrap_or(HistoryKind::Transform);
    let statements = match (req.sql, req.statements) {
        (Some(sql), extra) if extra.is_empty() => vec![sql],
        (None, statements) if !statements.is_empty() => statements,
        (None, _) => return Err(ApiError::BadRequest("either sql or statements is required".to_string())),
        (Some(_), _) => {
            return Err(ApiError::BadRequest(
                "sql and statements are mutually exclusive".to_string(),
            ));
        }
    };
    info!(statements = statements.len(), "mutation requested");

    state
        .mutate(move |store| {
            let description = req.description.as_deref();
            if let [sql] = statements.as_slice() {
                store.execute_mutation_as(kind, sql, description)?;
            } else {
                store.execute_transaction(&statements, kind, description)?;
            }
            Ok(Json(MutationResponse {
                row_count: store.row_count(),
                column_count: store.columns().len(),
                history_len: store.history().len(),
            }))
        })
        .await
}

/// Request body for a read-only query.
#[derive(Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}

/// POST /api/query
pub async fn post_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    state
        .with_store(move |store| Ok(Json(store.query_result(&req.sql)?)))
        .await
}

/// Whether an interrupt was delivered.
#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// POST /api/cancel
pub async fn post_cancel(State(state): State<AppState>) -> Json<CancelResponse> {
    let cancelled = state.is_busy() && state.cancel();
    info!(cancelled, "cancel requested");
    Json(CancelResponse { cancelled })
}
