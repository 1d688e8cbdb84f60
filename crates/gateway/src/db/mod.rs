//! Storefront `MySQL` access.
//!
//! The storefront schema is owned by the shop software; the gateway only
//! adds a handful of extension columns (see [`schema`]). Every table name
//! carries the configured prefix, so queries are built at runtime through
//! the [`Statements`] registry instead of compile-time checked macros.
//!
//! Repositories borrow the registry and take a `&mut MySqlConnection` per
//! call, which lets services compose several repository calls inside one
//! transaction.

pub mod api_keys;
pub mod attributes;
pub mod batches;
pub mod categories;
pub mod currencies;
pub mod images;
pub mod manufacturers;
pub mod orders;
pub mod products;
pub mod resolver;
pub mod schema;
pub mod statements;
pub mod tables;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub use api_keys::ApiKeyRepository;
pub use attributes::AttributeRepository;
pub use batches::BatchRepository;
pub use categories::CategoryRepository;
pub use currencies::CurrencyRepository;
pub use images::ProductImageRepository;
pub use manufacturers::ManufacturerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use resolver::UidResolver;
pub use statements::{Statement, Statements};
pub use tables::{TableError, TableGateway};

/// Connection attempts made at startup before giving up.
pub const CONNECT_ATTEMPTS: u32 = 5;
/// Delay between startup connection attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);
/// Interval between pool statistics log lines.
pub const POOL_STATS_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Convert an auto-increment value returned by `MySQL` into a row id.
pub(crate) fn insert_id(last_insert_id: u64) -> Result<i32, RepositoryError> {
    i32::try_from(last_insert_id).map_err(|_| {
        RepositoryError::DataCorruption(format!("insert id {last_insert_id} exceeds INT range"))
    })
}

/// Create a `MySQL` connection pool from configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = MySqlConnectOptions::from_str(config.url.expose_secret())?;

    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .max_lifetime(config.max_lifetime)
        .idle_timeout(Duration::from_secs(600))
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create the pool and verify it with a ping, retrying a fixed number of
/// times with a fixed delay.
///
/// # Errors
///
/// Returns the last connection error once every attempt has failed.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        let result = async {
            let pool = create_pool(config).await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        }
        .await;

        match result {
            Ok(pool) => {
                info!(attempt, "Database connection established");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(
                    error = %e,
                    attempt,
                    max_attempts = CONNECT_ATTEMPTS,
                    "Database not reachable, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Periodically log pool size and idle connections.
///
/// The task only reads pool counters and runs until the runtime shuts down.
#[must_use]
pub fn spawn_pool_stats(pool: MySqlPool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!(
                size = pool.size(),
                idle = pool.num_idle(),
                closed = pool.is_closed(),
                "Database pool statistics"
            );
        }
    })
}
