//! Product repository.
//!
//! Covers the `product` row and the rows that hang directly off it:
//! descriptions, specials, attribute values, category, store and layout
//! links. The product UID lives in the storefront's `model` column and the
//! article code in `sku`.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, QueryBuilder};

use ocsync_core::{
    AttributeId, CategoryId, CustomerGroupId, LanguageId, ManufacturerId, ProductId,
    ProductRecord,
};

use super::statements::{Statement, Statements};
use super::{RepositoryError, insert_id};

// =============================================================================
// Statements
// =============================================================================

const FIND_ID_BY_UID: Statement = Statement::new(
    "product.find_id_by_uid",
    "SELECT product_id FROM {product} WHERE model = ? LIMIT 1",
);

const FIND_BY_UID: Statement = Statement::new(
    "product.find_by_uid",
    r"SELECT product_id, model, sku, quantity, stock_status_id, image,
             manufacturer_id, price, status, batch_uid, date_modified
      FROM {product}
      WHERE model = ?
      LIMIT 1",
);

const INSERT: Statement = Statement::new(
    "product.insert",
    r"INSERT INTO {product}
        (model, sku, upc, ean, jan, isbn, mpn, location,
         quantity, minimum, subtract, stock_status_id, date_available,
         manufacturer_id, shipping, price, points,
         weight, weight_class_id, length, width, height, length_class_id,
         status, tax_class_id, sort_order, batch_uid, date_added, date_modified)
      VALUES
        (?, ?, '', '', '', '', '', '',
         ?, 1, 1, ?, ?,
         ?, 1, ?, 0,
         ?, ?, 0, 0, 0, 1,
         ?, ?, 0, ?, NOW(), NOW())",
);

const UPDATE: Statement = Statement::new(
    "product.update",
    r"UPDATE {product}
      SET sku = ?,
          quantity = ?,
          stock_status_id = ?,
          price = ?,
          manufacturer_id = ?,
          weight = COALESCE(?, weight),
          weight_class_id = COALESCE(?, weight_class_id),
          status = ?,
          batch_uid = ?,
          date_modified = NOW()
      WHERE product_id = ?",
);

const LINK_STORE: Statement = Statement::new(
    "product.link_store",
    "INSERT IGNORE INTO {product_to_store} (product_id, store_id) VALUES (?, 0)",
);

const LINK_LAYOUT: Statement = Statement::new(
    "product.link_layout",
    "INSERT IGNORE INTO {product_to_layout} (product_id, store_id, layout_id) VALUES (?, 0, 0)",
);

const DELETE_CATEGORY_LINKS: Statement = Statement::new(
    "product.delete_category_links",
    "DELETE FROM {product_to_category} WHERE product_id = ?",
);

const MAIN_IMAGE: Statement = Statement::new(
    "product.main_image",
    "SELECT image FROM {product} WHERE product_id = ?",
);

const SET_MAIN_IMAGE: Statement = Statement::new(
    "product.set_main_image",
    "UPDATE {product} SET image = ?, date_modified = NOW() WHERE product_id = ?",
);

const FIND_DESCRIPTION: Statement = Statement::new(
    "product_description.find",
    "SELECT name FROM {product_description} WHERE product_id = ? AND language_id = ?",
);

const INSERT_DESCRIPTION: Statement = Statement::new(
    "product_description.insert",
    r"INSERT INTO {product_description}
        (product_id, language_id, name, description, tag, meta_title, meta_description, meta_keyword)
      VALUES (?, ?, ?, ?, '', ?, '', '')",
);

const UPDATE_DESCRIPTION_NAME: Statement = Statement::new(
    "product_description.update_name",
    r"UPDATE {product_description}
      SET name = ?, meta_title = ?
      WHERE product_id = ? AND language_id = ?",
);

const UPDATE_DESCRIPTION_FULL: Statement = Statement::new(
    "product_description.update_full",
    r"UPDATE {product_description}
      SET name = ?, meta_title = ?, description = ?
      WHERE product_id = ? AND language_id = ?",
);

const FIND_SPECIAL: Statement = Statement::new(
    "product_special.find",
    r"SELECT product_special_id FROM {product_special}
      WHERE product_id = ? AND customer_group_id = ?
      ORDER BY product_special_id
      LIMIT 1",
);

const INSERT_SPECIAL: Statement = Statement::new(
    "product_special.insert",
    r"INSERT INTO {product_special}
        (product_id, customer_group_id, priority, price, date_start, date_end)
      VALUES (?, ?, ?, ?, ?, ?)",
);

const UPDATE_SPECIAL: Statement = Statement::new(
    "product_special.update",
    r"UPDATE {product_special}
      SET priority = ?, price = ?, date_start = ?, date_end = ?
      WHERE product_special_id = ?",
);

const DELETE_DUPLICATE_SPECIALS: Statement = Statement::new(
    "product_special.delete_duplicates",
    r"DELETE FROM {product_special}
      WHERE product_id = ? AND customer_group_id = ? AND product_special_id <> ?",
);

const FIND_ATTRIBUTE_VALUE: Statement = Statement::new(
    "product_attribute.find",
    r"SELECT COUNT(*) FROM {product_attribute}
      WHERE product_id = ? AND attribute_id = ? AND language_id = ?",
);

const INSERT_ATTRIBUTE_VALUE: Statement = Statement::new(
    "product_attribute.insert",
    r"INSERT INTO {product_attribute} (product_id, attribute_id, language_id, text)
      VALUES (?, ?, ?, ?)",
);

const UPDATE_ATTRIBUTE_VALUE: Statement = Statement::new(
    "product_attribute.update",
    r"UPDATE {product_attribute} SET text = ?
      WHERE product_id = ? AND attribute_id = ? AND language_id = ?",
);

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    product_id: ProductId,
    model: String,
    sku: String,
    quantity: i32,
    stock_status_id: i32,
    image: Option<String>,
    manufacturer_id: ManufacturerId,
    price: Decimal,
    status: bool,
    batch_uid: Option<String>,
    date_modified: NaiveDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            product_id: row.product_id,
            uid: row.model,
            article: row.sku,
            quantity: row.quantity,
            stock_status_id: row.stock_status_id,
            image: row.image.filter(|path| !path.is_empty()),
            manufacturer_id: row.manufacturer_id,
            price: row.price,
            status: row.status,
            batch_uid: row.batch_uid.filter(|uid| !uid.is_empty()),
            date_modified: row.date_modified,
        }
    }
}

// =============================================================================
// Write Models
// =============================================================================

/// Column values for a product row, already derived from the payload.
#[derive(Debug, Clone)]
pub struct ProductWrite<'p> {
    pub uid: &'p str,
    pub sku: &'p str,
    pub quantity: i32,
    pub stock_status_id: i32,
    pub manufacturer_id: ManufacturerId,
    pub price: Decimal,
    pub weight: Option<Decimal>,
    pub weight_class_id: Option<i32>,
    pub status: i8,
    pub batch_uid: &'p str,
}

/// Product special values.
#[derive(Debug, Clone, Copy)]
pub struct SpecialWrite {
    pub group_id: CustomerGroupId,
    pub priority: i32,
    pub price: Decimal,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

/// Storage value for an open special window bound.
fn special_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "0000-00-00".to_string(), |d| d.to_string())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product rows.
pub struct ProductRepository<'a> {
    statements: &'a Statements,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Internal id for a product UID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_uid(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<ProductId>, RepositoryError> {
        let sql = self.statements.sql(&FIND_ID_BY_UID);
        let id = sqlx::query_scalar::<_, ProductId>(&sql)
            .bind(uid)
            .fetch_optional(conn)
            .await?;
        Ok(id)
    }

    /// Product row for a UID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_uid(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<ProductRecord>, RepositoryError> {
        let sql = self.statements.sql(&FIND_BY_UID);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(uid)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Insert a new product row with storefront defaults for every column
    /// the payload does not carry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        conn: &mut MySqlConnection,
        product: &ProductWrite<'_>,
        date_available: NaiveDate,
        tax_class_id: i32,
    ) -> Result<ProductId, RepositoryError> {
        let sql = self.statements.sql(&INSERT);
        let result = sqlx::query(&sql)
            .bind(product.uid)
            .bind(product.sku)
            .bind(product.quantity)
            .bind(product.stock_status_id)
            .bind(date_available)
            .bind(product.manufacturer_id)
            .bind(product.price)
            .bind(product.weight.unwrap_or_default())
            .bind(product.weight_class_id.unwrap_or(1))
            .bind(product.status)
            .bind(tax_class_id)
            .bind(product.batch_uid)
            .execute(conn)
            .await?;
        Ok(ProductId::new(insert_id(result.last_insert_id())?))
    }

    /// Link a product to the default store and layout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn link_defaults(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&LINK_STORE);
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        let sql = self.statements.sql(&LINK_LAYOUT);
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        Ok(())
    }

    /// Update the synchronized columns of an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        product: &ProductWrite<'_>,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&UPDATE);
        sqlx::query(&sql)
            .bind(product.sku)
            .bind(product.quantity)
            .bind(product.stock_status_id)
            .bind(product.price)
            .bind(product.manufacturer_id)
            .bind(product.weight)
            .bind(product.weight_class_id)
            .bind(product.status)
            .bind(product.batch_uid)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Replace the product's category links with `categories`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn replace_categories(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        categories: &[CategoryId],
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&DELETE_CATEGORY_LINKS);
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

        if categories.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<sqlx::MySql>::new(format!(
            "INSERT IGNORE INTO {} (product_id, category_id) ",
            self.statements.table("product_to_category")
        ));
        qb.push_values(categories, |mut b, category_id| {
            b.push_bind(id).push_bind(*category_id);
        });
        qb.build().execute(conn).await?;
        Ok(())
    }

    /// Set one whitelisted column.
    ///
    /// `column` must come from the configured allow-list; it is interpolated
    /// into the statement as an identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_custom_field(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        column: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE {} SET `{column}` = ? WHERE product_id = ?",
            self.statements.table("product")
        );
        sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .persistent(false)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Stored main image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn main_image(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
    ) -> Result<Option<String>, RepositoryError> {
        let sql = self.statements.sql(&MAIN_IMAGE);
        let image = sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(image.flatten().filter(|path| !path.is_empty()))
    }

    /// Set the main image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_main_image(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        path: &str,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&SET_MAIN_IMAGE);
        sqlx::query(&sql).bind(path).bind(id).execute(conn).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Descriptions
    // -------------------------------------------------------------------------

    /// Whether a description exists for (product, language).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn description_exists(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        language_id: LanguageId,
    ) -> Result<bool, RepositoryError> {
        let sql = self.statements.sql(&FIND_DESCRIPTION);
        let name = sqlx::query_scalar::<_, String>(&sql)
            .bind(id)
            .bind(language_id.as_i32())
            .fetch_optional(conn)
            .await?;
        Ok(name.is_some())
    }

    /// Insert a description. The meta title starts out as the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_description(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        language_id: LanguageId,
        name: &str,
        description: &str,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&INSERT_DESCRIPTION);
        sqlx::query(&sql)
            .bind(id)
            .bind(language_id.as_i32())
            .bind(name)
            .bind(description)
            .bind(name)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Update a description. `description: None` keeps the stored body.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_description(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        language_id: LanguageId,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let query = match description {
            Some(body) => {
                let sql = self.statements.sql(&UPDATE_DESCRIPTION_FULL);
                sqlx::query(&sql)
                    .bind(name)
                    .bind(name)
                    .bind(body)
                    .bind(id)
                    .bind(language_id.as_i32())
                    .execute(conn)
                    .await
            }
            None => {
                let sql = self.statements.sql(&UPDATE_DESCRIPTION_NAME);
                sqlx::query(&sql)
                    .bind(name)
                    .bind(name)
                    .bind(id)
                    .bind(language_id.as_i32())
                    .execute(conn)
                    .await
            }
        };
        query?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Specials
    // -------------------------------------------------------------------------

    /// Insert or update the special for (product, customer group), leaving
    /// exactly one row for the pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert_special(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        special: &SpecialWrite,
    ) -> Result<(), RepositoryError> {
        let group = special.group_id.as_i32();
        let start = special_date(special.date_start);
        let end = special_date(special.date_end);

        let sql = self.statements.sql(&FIND_SPECIAL);
        let existing = sqlx::query_scalar::<_, i32>(&sql)
            .bind(id)
            .bind(group)
            .fetch_optional(&mut *conn)
            .await?;

        match existing {
            Some(special_id) => {
                let sql = self.statements.sql(&UPDATE_SPECIAL);
                sqlx::query(&sql)
                    .bind(special.priority)
                    .bind(special.price)
                    .bind(&start)
                    .bind(&end)
                    .bind(special_id)
                    .execute(&mut *conn)
                    .await?;

                let sql = self.statements.sql(&DELETE_DUPLICATE_SPECIALS);
                sqlx::query(&sql)
                    .bind(id)
                    .bind(group)
                    .bind(special_id)
                    .execute(conn)
                    .await?;
            }
            None => {
                let sql = self.statements.sql(&INSERT_SPECIAL);
                sqlx::query(&sql)
                    .bind(id)
                    .bind(group)
                    .bind(special.priority)
                    .bind(special.price)
                    .bind(&start)
                    .bind(&end)
                    .execute(conn)
                    .await?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attribute values
    // -------------------------------------------------------------------------

    /// Insert or update an attribute value for (product, attribute, language).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert_attribute_value(
        &self,
        conn: &mut MySqlConnection,
        id: ProductId,
        attribute_id: AttributeId,
        language_id: LanguageId,
        text: &str,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&FIND_ATTRIBUTE_VALUE);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .bind(attribute_id)
            .bind(language_id.as_i32())
            .fetch_one(&mut *conn)
            .await?;

        if count > 0 {
            let sql = self.statements.sql(&UPDATE_ATTRIBUTE_VALUE);
            sqlx::query(&sql)
                .bind(text)
                .bind(id)
                .bind(attribute_id)
                .bind(language_id.as_i32())
                .execute(conn)
                .await?;
        } else {
            let sql = self.statements.sql(&INSERT_ATTRIBUTE_VALUE);
            sqlx::query(&sql)
                .bind(id)
                .bind(attribute_id)
                .bind(language_id.as_i32())
                .bind(text)
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
    fn test_special_date_open_bound() {
        assert_eq!(special_date(None), "0000-00-00");
        assert_eq!(
            special_date(NaiveDate::from_ymd_opt(2024, 12, 1)),
            "2024-12-01"
        );
    }

    #[test]
    fn test_statements_render_with_prefix() {
        let statements = Statements::new("oc_");
        let sql = statements.sql(&FIND_ID_BY_UID);
        assert_eq!(
            &*sql,
            "SELECT product_id FROM `oc_product` WHERE model = ? LIMIT 1"
        );
        let sql = statements.sql(&LINK_LAYOUT);
        assert!(sql.contains("`oc_product_to_layout`"));
    }
}
