//! Batch finalize from the command line.
//!
//! ```bash
//! ocsync batch finalize 2026-10-19-full
//! ```

use super::{CommandError, connect};

/// Finalize `batch_uid` and print the result as JSON.
pub async fn finalize(batch_uid: &str) -> Result<(), CommandError> {
    let state = connect().await?;

    let result = state.batch().finalize(batch_uid).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
