//! Guarded generic table access.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Map, Value};
use tracing::info;

use ocsync_core::{DeleteRequest, FetchRequest};

use super::{ApiResult, ok};
use crate::middleware::RequireApiKey;
use crate::services::SyncError;
use crate::state::AppState;

/// Read rows from a whitelisted table.
pub async fn fetch(
    State(state): State<AppState>,
    RequireApiKey(username): RequireApiKey,
    body: Result<Json<FetchRequest>, JsonRejection>,
) -> ApiResult<Vec<Map<String, Value>>> {
    let Json(request) = body?;
    let rows = state
        .tables()
        .read(&request.table, &request.filter, request.limit, request.plain)
        .await
        .map_err(SyncError::from)?;

    info!(
        username = %username,
        table = %request.table,
        rows = rows.len(),
        "Table read"
    );
    ok(rows)
}

/// Delete rows from a whitelisted table; returns the number removed.
pub async fn delete(
    State(state): State<AppState>,
    RequireApiKey(username): RequireApiKey,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<u64> {
    let Json(request) = body?;
    let deleted = state
        .tables()
        .delete(&request.table, &request.filter)
        .await
        .map_err(SyncError::from)?;

    info!(
        username = %username,
        table = %request.table,
        filter = %request.filter,
        deleted,
        "Table rows deleted"
    );
    ok(deleted)
}
