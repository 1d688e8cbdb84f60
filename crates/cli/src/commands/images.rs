//! Image file maintenance.

use super::{CommandError, connect};

/// Delete image files that no product row references.
pub async fn collect_garbage() -> Result<(), CommandError> {
    let state = connect().await?;

    let dir = state.images().store().dir().display().to_string();
    let deleted = state.images().collect_garbage().await?;

    tracing::info!(dir = %dir, deleted, "Image garbage collection complete");
    Ok(())
}
