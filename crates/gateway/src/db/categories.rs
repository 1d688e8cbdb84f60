//! Category repository.
//!
//! The external UID is kept in the `category_uid` extension column, the
//! parent's UID in `parent_uid`. Stub rows (created when a product or child
//! category references a category that has not been pushed yet) start
//! disabled with no parent.

use sqlx::MySqlConnection;

use ocsync_core::{CategoryId, LanguageId};

use super::statements::{Statement, Statements};
use super::{RepositoryError, insert_id};

const FIND_ID_BY_UID: Statement = Statement::new(
    "category.find_id_by_uid",
    "SELECT category_id FROM {category} WHERE category_uid = ? LIMIT 1",
);

const INSERT_STUB: Statement = Statement::new(
    "category.insert_stub",
    r"INSERT INTO {category}
        (category_uid, image, parent_id, parent_uid, top, `column`, sort_order, status,
         date_added, date_modified)
      VALUES (?, '', 0, '', 0, 1, 0, 0, NOW(), NOW())",
);

const LINK_STORE: Statement = Statement::new(
    "category.link_store",
    "INSERT IGNORE INTO {category_to_store} (category_id, store_id) VALUES (?, 0)",
);

const UPDATE: Statement = Statement::new(
    "category.update",
    r"UPDATE {category}
      SET parent_id = ?,
          parent_uid = ?,
          top = ?,
          sort_order = ?,
          status = ?,
          date_modified = NOW()
      WHERE category_id = ?",
);

const COUNT_ACTIVE: Statement = Statement::new(
    "category.count_active",
    "SELECT COUNT(*) FROM {category} WHERE status = 1",
);

const DESCRIPTION_EXISTS: Statement = Statement::new(
    "category_description.exists",
    "SELECT COUNT(*) FROM {category_description} WHERE category_id = ? AND language_id = ?",
);

const INSERT_DESCRIPTION: Statement = Statement::new(
    "category_description.insert",
    r"INSERT INTO {category_description}
        (category_id, language_id, name, description, meta_title, meta_description, meta_keyword)
      VALUES (?, ?, ?, ?, ?, ?, '')",
);

const UPDATE_DESCRIPTION: Statement = Statement::new(
    "category_description.update",
    r"UPDATE {category_description}
      SET name = ?, description = ?, meta_title = ?, meta_description = ?
      WHERE category_id = ? AND language_id = ?",
);

/// Column values for a category update.
#[derive(Debug, Clone, Copy)]
pub struct CategoryWrite<'c> {
    pub parent_id: CategoryId,
    pub parent_uid: &'c str,
    pub top: bool,
    pub sort_order: i32,
    pub status: bool,
}

/// Repository for category rows.
pub struct CategoryRepository<'a> {
    statements: &'a Statements,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Internal id for a category UID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_uid(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<CategoryId>, RepositoryError> {
        let sql = self.statements.sql(&FIND_ID_BY_UID);
        let id = sqlx::query_scalar::<_, CategoryId>(&sql)
            .bind(uid)
            .fetch_optional(conn)
            .await?;
        Ok(id)
    }

    /// Insert a disabled, parentless category stub for `uid`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn insert_stub(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<CategoryId, RepositoryError> {
        let sql = self.statements.sql(&INSERT_STUB);
        let result = sqlx::query(&sql).bind(uid).execute(&mut *conn).await?;
        let id = CategoryId::new(insert_id(result.last_insert_id())?);

        let sql = self.statements.sql(&LINK_STORE);
        sqlx::query(&sql).bind(id).execute(conn).await?;
        Ok(id)
    }

    /// Update the synchronized columns of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        conn: &mut MySqlConnection,
        id: CategoryId,
        category: &CategoryWrite<'_>,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&UPDATE);
        sqlx::query(&sql)
            .bind(category.parent_id)
            .bind(category.parent_uid)
            .bind(category.top)
            .bind(category.sort_order)
            .bind(category.status)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Number of enabled categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, conn: &mut MySqlConnection) -> Result<i64, RepositoryError> {
        let sql = self.statements.sql(&COUNT_ACTIVE);
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn).await?;
        Ok(count)
    }

    /// Insert or replace the description for (category, language).
    ///
    /// Meta title and meta description follow the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert_description(
        &self,
        conn: &mut MySqlConnection,
        id: CategoryId,
        language_id: LanguageId,
        name: &str,
        description: &str,
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
                .bind(description)
                .bind(name)
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
                .bind(description)
                .bind(name)
                .bind(name)
                .execute(conn)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_quotes_reserved_column() {
        let statements = Statements::new("oc_");
        let sql = statements.sql(&INSERT_STUB);
        assert!(sql.contains("INSERT INTO `oc_category`"));
        assert!(sql.contains("`column`"));
    }
}
