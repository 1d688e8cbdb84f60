//! Manufacturer repository. Manufacturers are matched by exact name.

use sqlx::MySqlConnection;

use ocsync_core::ManufacturerId;

use super::statements::{Statement, Statements};
use super::{RepositoryError, insert_id};

const FIND_BY_NAME: Statement = Statement::new(
    "manufacturer.find_by_name",
    "SELECT manufacturer_id FROM {manufacturer} WHERE name = ? LIMIT 1",
);

const INSERT: Statement = Statement::new(
    "manufacturer.insert",
    "INSERT INTO {manufacturer} (name, image, sort_order) VALUES (?, '', 0)",
);

const LINK_STORE: Statement = Statement::new(
    "manufacturer.link_store",
    "INSERT IGNORE INTO {manufacturer_to_store} (manufacturer_id, store_id) VALUES (?, 0)",
);

/// Repository for manufacturer rows.
pub struct ManufacturerRepository<'a> {
    statements: &'a Statements,
}

impl<'a> ManufacturerRepository<'a> {
    /// Create a new manufacturer repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(
        &self,
        conn: &mut MySqlConnection,
        name: &str,
    ) -> Result<Option<ManufacturerId>, RepositoryError> {
        let sql = self.statements.sql(&FIND_BY_NAME);
        let id = sqlx::query_scalar::<_, ManufacturerId>(&sql)
            .bind(name)
            .fetch_optional(conn)
            .await?;
        Ok(id)
    }

    /// Insert a manufacturer and link it to the default store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn insert(
        &self,
        conn: &mut MySqlConnection,
        name: &str,
    ) -> Result<ManufacturerId, RepositoryError> {
        let sql = self.statements.sql(&INSERT);
        let result = sqlx::query(&sql).bind(name).execute(&mut *conn).await?;
        let id = ManufacturerId::new(insert_id(result.last_insert_id())?);

        let sql = self.statements.sql(&LINK_STORE);
        sqlx::query(&sql).bind(id).execute(conn).await?;
        Ok(id)
    }
}
