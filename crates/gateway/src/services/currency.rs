//! Currency rate updates.

use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::{info, instrument};

use ocsync_core::CurrencyRate;

use super::error::SyncError;
use crate::db::{CurrencyRepository, RepositoryError, Statements};

/// Currency service.
#[derive(Clone)]
pub struct CurrencyService {
    pool: MySqlPool,
    statements: Arc<Statements>,
}

impl CurrencyService {
    /// Create a new currency service.
    #[must_use]
    pub const fn new(pool: MySqlPool, statements: Arc<Statements>) -> Self {
        Self { pool, statements }
    }

    /// Set the exchange rate of an existing currency.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` for a rate below the minimum,
    /// `SyncError::NotFound` for an unknown currency code, or
    /// `SyncError::Database` if the update fails.
    #[instrument(skip(self, rate), fields(code = %rate.code))]
    pub async fn set_rate(&self, rate: &CurrencyRate) -> Result<(), SyncError> {
        rate.validate()?;

        let mut conn = self.pool.acquire().await?;
        match CurrencyRepository::new(&self.statements)
            .set_rate(&mut conn, &rate.code, rate.rate)
            .await
        {
            Ok(()) => {
                info!(rate = %rate.rate, "Currency rate updated");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                Err(SyncError::NotFound(format!("currency {}", rate.code)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
