//! Storefront schema preparation.
//!
//! ```bash
//! ocsync schema
//! ```

use ocsync_gateway::db::schema::ensure_extension_columns;

use super::{CommandError, connect};

/// Add any missing extension columns and their indexes.
pub async fn ensure() -> Result<(), CommandError> {
    let state = connect().await?;

    let added = ensure_extension_columns(state.pool(), state.statements()).await?;
    if added.is_empty() {
        tracing::info!("Schema already up to date");
    } else {
        tracing::info!(columns = ?added, "Extension columns added");
    }
    Ok(())
}
