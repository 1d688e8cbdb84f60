//! Batch finalize handler.

use axum::extract::{Path, State, rejection::PathRejection};
use tracing::info;

use ocsync_core::BatchResult;

use super::{ApiResult, ok};
use crate::middleware::RequireApiKey;
use crate::state::AppState;

/// Deactivate products outside the batch, then collect orphan images.
pub async fn finalize(
    State(state): State<AppState>,
    RequireApiKey(username): RequireApiKey,
    batch_uid: Result<Path<String>, PathRejection>,
) -> ApiResult<BatchResult> {
    let Path(batch_uid) = batch_uid?;
    info!(username = %username, batch_uid = %batch_uid, "Batch finalize requested");
    ok(state.batch().finalize(&batch_uid).await?)
}
