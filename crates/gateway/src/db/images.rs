//! Product image rows.
//!
//! Additional images live in `product_image`, keyed by the `file_uid`
//! extension column. The main image is the `image` column of the product
//! row itself (see [`super::ProductRepository::set_main_image`]).

use sqlx::{MySqlConnection, QueryBuilder};

use ocsync_core::{ProductId, ProductImageId};

use super::statements::{Statement, Statements};
use super::{RepositoryError, insert_id};

const LIST: Statement = Statement::new(
    "product_image.list",
    r"SELECT product_image_id, COALESCE(file_uid, '') AS file_uid
      FROM {product_image}
      WHERE product_id = ?
      ORDER BY product_image_id",
);

const INSERT: Statement = Statement::new(
    "product_image.insert",
    r"INSERT INTO {product_image} (product_id, image, file_uid, sort_order)
      VALUES (?, ?, ?, ?)",
);

const FIND_BY_FILE_UID: Statement = Statement::new(
    "product_image.find_by_file_uid",
    r"SELECT product_image_id FROM {product_image}
      WHERE product_id = ? AND file_uid = ?
      ORDER BY product_image_id
      LIMIT 1",
);

const UPDATE: Statement = Statement::new(
    "product_image.update",
    "UPDATE {product_image} SET image = ?, sort_order = ? WHERE product_image_id = ?",
);

const REFERENCED_PATHS: Statement = Statement::new(
    "product_image.referenced_paths",
    r"SELECT image FROM {product} WHERE image IS NOT NULL AND image <> ''
      UNION
      SELECT image FROM {product_image} WHERE image IS NOT NULL AND image <> ''",
);

/// An existing additional-image row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ImageRow {
    pub product_image_id: ProductImageId,
    pub file_uid: String,
}

/// Repository for product image rows.
pub struct ProductImageRepository<'a> {
    statements: &'a Statements,
}

impl<'a> ProductImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Additional-image rows of a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        conn: &mut MySqlConnection,
        product_id: ProductId,
    ) -> Result<Vec<ImageRow>, RepositoryError> {
        let sql = self.statements.sql(&LIST);
        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(product_id)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    /// Delete rows by id. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_rows(
        &self,
        conn: &mut MySqlConnection,
        ids: &[ProductImageId],
    ) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<sqlx::MySql>::new(format!(
            "DELETE FROM {} WHERE product_image_id IN (",
            self.statements.table("product_image")
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = qb.build().execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        conn: &mut MySqlConnection,
        product_id: ProductId,
        path: &str,
        file_uid: &str,
        sort_order: i32,
    ) -> Result<ProductImageId, RepositoryError> {
        let sql = self.statements.sql(&INSERT);
        let result = sqlx::query(&sql)
            .bind(product_id)
            .bind(path)
            .bind(file_uid)
            .bind(sort_order)
            .execute(conn)
            .await?;
        Ok(ProductImageId::new(insert_id(result.last_insert_id())?))
    }

    /// Insert or update the row for (product, file UID).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert(
        &self,
        conn: &mut MySqlConnection,
        product_id: ProductId,
        path: &str,
        file_uid: &str,
        sort_order: i32,
    ) -> Result<ProductImageId, RepositoryError> {
        let sql = self.statements.sql(&FIND_BY_FILE_UID);
        let existing = sqlx::query_scalar::<_, ProductImageId>(&sql)
            .bind(product_id)
            .bind(file_uid)
            .fetch_optional(&mut *conn)
            .await?;

        match existing {
            Some(id) => {
                let sql = self.statements.sql(&UPDATE);
                sqlx::query(&sql)
                    .bind(path)
                    .bind(sort_order)
                    .bind(id)
                    .execute(conn)
                    .await?;
                Ok(id)
            }
            None => self.insert(conn, product_id, path, file_uid, sort_order).await,
        }
    }

    /// Every image path referenced by a product or an additional image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn referenced_paths(
        &self,
        conn: &mut MySqlConnection,
    ) -> Result<Vec<String>, RepositoryError> {
        let sql = self.statements.sql(&REFERENCED_PATHS);
        let paths = sqlx::query_scalar::<_, String>(&sql).fetch_all(conn).await?;
        Ok(paths)
    }
}
