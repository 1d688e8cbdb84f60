//! Currency rate updates.

use rust_decimal::Decimal;
use sqlx::MySqlConnection;

use ocsync_core::CurrencyCode;

use super::RepositoryError;
use super::statements::{Statement, Statements};

const FIND_ID: Statement = Statement::new(
    "currency.find_id",
    "SELECT currency_id FROM {currency} WHERE code = ? LIMIT 1",
);

const SET_VALUE: Statement = Statement::new(
    "currency.set_value",
    "UPDATE {currency} SET value = ?, date_modified = NOW() WHERE currency_id = ?",
);

/// Repository for currency rows.
pub struct CurrencyRepository<'a> {
    statements: &'a Statements,
}

impl<'a> CurrencyRepository<'a> {
    /// Create a new currency repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Set the exchange rate of an existing currency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no currency has this code, or
    /// `RepositoryError::Database` if a statement fails.
    pub async fn set_rate(
        &self,
        conn: &mut MySqlConnection,
        code: &CurrencyCode,
        rate: Decimal,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&FIND_ID);
        let id = sqlx::query_scalar::<_, i32>(&sql)
            .bind(code.as_str())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let sql = self.statements.sql(&SET_VALUE);
        sqlx::query(&sql).bind(rate).bind(id).execute(conn).await?;
        Ok(())
    }
}
