//! Attribute repository.
//!
//! Attributes are keyed by the `attribute_uid` extension column and carry
//! one name per language in `attribute_description`.

use sqlx::MySqlConnection;

use ocsync_core::{AttributeId, LanguageId};

use super::statements::{Statement, Statements};
use super::{RepositoryError, insert_id};

const FIND_ID_BY_UID: Statement = Statement::new(
    "attribute.find_id_by_uid",
    "SELECT attribute_id FROM {attribute} WHERE attribute_uid = ? LIMIT 1",
);

const INSERT: Statement = Statement::new(
    "attribute.insert",
    "INSERT INTO {attribute} (attribute_uid, attribute_group_id, sort_order) VALUES (?, ?, ?)",
);

const UPDATE: Statement = Statement::new(
    "attribute.update",
    "UPDATE {attribute} SET attribute_group_id = ?, sort_order = ? WHERE attribute_id = ?",
);

const DESCRIPTION_EXISTS: Statement = Statement::new(
    "attribute_description.exists",
    "SELECT COUNT(*) FROM {attribute_description} WHERE attribute_id = ? AND language_id = ?",
);

const INSERT_DESCRIPTION: Statement = Statement::new(
    "attribute_description.insert",
    "INSERT INTO {attribute_description} (attribute_id, language_id, name) VALUES (?, ?, ?)",
);

const UPDATE_DESCRIPTION: Statement = Statement::new(
    "attribute_description.update",
    "UPDATE {attribute_description} SET name = ? WHERE attribute_id = ? AND language_id = ?",
);

/// Repository for attribute rows.
pub struct AttributeRepository<'a> {
    statements: &'a Statements,
}

impl<'a> AttributeRepository<'a> {
    /// Create a new attribute repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Internal id for an attribute UID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_uid(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<AttributeId>, RepositoryError> {
        let sql = self.statements.sql(&FIND_ID_BY_UID);
        let id = sqlx::query_scalar::<_, AttributeId>(&sql)
            .bind(uid)
            .fetch_optional(conn)
            .await?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
        group_id: i32,
        sort_order: i32,
    ) -> Result<AttributeId, RepositoryError> {
        let sql = self.statements.sql(&INSERT);
        let result = sqlx::query(&sql)
            .bind(uid)
            .bind(group_id)
            .bind(sort_order)
            .execute(conn)
            .await?;
        Ok(AttributeId::new(insert_id(result.last_insert_id())?))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        conn: &mut MySqlConnection,
        id: AttributeId,
        group_id: i32,
        sort_order: i32,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&UPDATE);
        sqlx::query(&sql)
            .bind(group_id)
            .bind(sort_order)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Insert or rename the description for (attribute, language).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert_description(
        &self,
        conn: &mut MySqlConnection,
        id: AttributeId,
        language_id: LanguageId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&DESCRIPTION_EXISTS);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .bind(language_id)
            .fetch_one(&mut *conn)
            .await?;

        if count > 0 {
            let sql = self.statements.sql(&UPDATE_DESCRIPTION);
            sqlx::query(&sql)
                .bind(name)
                .bind(id)
                .bind(language_id)
                .execute(conn)
                .await?;
        } else {
            let sql = self.statements.sql(&INSERT_DESCRIPTION);
            sqlx::query(&sql)
                .bind(id)
                .bind(language_id)
                .bind(name)
                .execute(conn)
                .await?;
        }
        Ok(())
    }
}
