//! Product lookups.

use super::{CommandError, connect};

/// Print the product stored under `uid`.
pub async fn show(uid: &str) -> Result<(), CommandError> {
    let state = connect().await?;

    let product = state.catalog().product(uid).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&product)?);
    }
    Ok(())
}
