//! Command implementations.
//!
//! Every command loads [`GatewayConfig`] from the environment and connects
//! to the storefront database the same way the gateway does.

pub mod batch;
pub mod images;
pub mod product;
pub mod schema;

use thiserror::Error;

use ocsync_gateway::config::{ConfigError, GatewayConfig};
use ocsync_gateway::db::{self, RepositoryError};
use ocsync_gateway::services::SyncError;
use ocsync_gateway::state::AppState;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Load configuration and connect, retrying like the gateway.
pub(crate) async fn connect() -> Result<AppState, CommandError> {
    let config = GatewayConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::connect_with_retry(&config.database).await?;

    Ok(AppState::new(config, pool))
}
