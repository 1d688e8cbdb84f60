//! Batch lifecycle queries.
//!
//! Every product write tags the row with the ingestion run's batch UID.
//! Finalizing a run disables products that were not touched by it and then
//! clears the tags so the next run starts from a clean slate.

use sqlx::MySqlConnection;

use super::RepositoryError;
use super::statements::{Statement, Statements};

const COUNT_TAGGED: Statement = Statement::new(
    "batch.count_tagged",
    "SELECT COUNT(*) FROM {product} WHERE batch_uid = ?",
);

const DEACTIVATE_UNTAGGED: Statement = Statement::new(
    "batch.deactivate_untagged",
    r"UPDATE {product}
      SET status = 0, date_modified = NOW()
      WHERE COALESCE(batch_uid, '') <> ? AND status <> 0",
);

const CLEAR_TAGS: Statement = Statement::new(
    "batch.clear_tags",
    "UPDATE {product} SET batch_uid = '' WHERE batch_uid <> ''",
);

const COUNT_ACTIVE_PRODUCTS: Statement = Statement::new(
    "batch.count_active_products",
    "SELECT COUNT(*) FROM {product} WHERE status = 1",
);

/// Repository for batch bookkeeping on the product table.
pub struct BatchRepository<'a> {
    statements: &'a Statements,
}

impl<'a> BatchRepository<'a> {
    /// Create a new batch repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Number of products tagged with `batch_uid`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_tagged(
        &self,
        conn: &mut MySqlConnection,
        batch_uid: &str,
    ) -> Result<i64, RepositoryError> {
        let sql = self.statements.sql(&COUNT_TAGGED);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(batch_uid)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// Disable every enabled product not tagged with `batch_uid`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn deactivate_untagged(
        &self,
        conn: &mut MySqlConnection,
        batch_uid: &str,
    ) -> Result<u64, RepositoryError> {
        let sql = self.statements.sql(&DEACTIVATE_UNTAGGED);
        let result = sqlx::query(&sql).bind(batch_uid).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// Clear every batch tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn clear_tags(&self, conn: &mut MySqlConnection) -> Result<u64, RepositoryError> {
        let sql = self.statements.sql(&CLEAR_TAGS);
        let result = sqlx::query(&sql).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// Number of enabled products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active_products(
        &self,
        conn: &mut MySqlConnection,
    ) -> Result<i64, RepositoryError> {
        let sql = self.statements.sql(&COUNT_ACTIVE_PRODUCTS);
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn).await?;
        Ok(count)
    }
}
