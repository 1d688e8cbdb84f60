//! Order repository.
//!
//! Orders are read-mostly: the gateway exposes headers, line items and
//! totals, and lets the catalog-management process move an order to a new
//! status with a history entry.

use chrono::NaiveDate;
use sqlx::MySqlConnection;

use ocsync_core::{Order, OrderId, OrderProduct, OrderStatusId, OrderTotal};

use super::RepositoryError;
use super::statements::{Statement, Statements};

const FIND: Statement = Statement::new(
    "order.find",
    r"SELECT order_id, invoice_no, invoice_prefix, store_id, store_name,
             customer_id, customer_group_id, firstname, lastname, email, telephone,
             payment_firstname, payment_lastname, payment_company,
             payment_address_1, payment_address_2, payment_city, payment_postcode,
             payment_country, payment_zone, payment_method, payment_code,
             shipping_firstname, shipping_lastname, shipping_company,
             shipping_address_1, shipping_address_2, shipping_city, shipping_postcode,
             shipping_country, shipping_zone, shipping_method, shipping_code,
             comment, total, order_status_id, language_id, currency_id,
             currency_code, currency_value, date_added, date_modified
      FROM {order}
      WHERE order_id = ?",
);

const PRODUCTS: Statement = Statement::new(
    "order.products",
    r"SELECT order_product_id, order_id, product_id, name, model,
             quantity, price, total, tax, reward
      FROM {order_product}
      WHERE order_id = ?
      ORDER BY order_product_id",
);

const TOTALS: Statement = Statement::new(
    "order.totals",
    r"SELECT order_total_id, order_id, code, title, value, sort_order
      FROM {order_total}
      WHERE order_id = ?
      ORDER BY sort_order",
);

const IDS_BY_STATUS: Statement = Statement::new(
    "order.ids_by_status",
    r"SELECT order_id FROM {order}
      WHERE order_status_id = ? AND date_modified >= ?
      ORDER BY order_id",
);

const EXISTS: Statement = Statement::new(
    "order.exists",
    "SELECT COUNT(*) FROM {order} WHERE order_id = ?",
);

const SET_STATUS: Statement = Statement::new(
    "order.set_status",
    "UPDATE {order} SET order_status_id = ?, date_modified = NOW() WHERE order_id = ?",
);

const ADD_HISTORY: Statement = Statement::new(
    "order.add_history",
    r"INSERT INTO {order_history} (order_id, order_status_id, notify, comment, date_added)
      VALUES (?, ?, 0, ?, NOW())",
);

/// Lower bound used when no `from` date is given.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Repository for order rows.
pub struct OrderRepository<'a> {
    statements: &'a Statements,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(statements: &'a Statements) -> Self {
        Self { statements }
    }

    /// Order header by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        conn: &mut MySqlConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = self.statements.sql(&FIND);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(order)
    }

    /// Line items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(
        &self,
        conn: &mut MySqlConnection,
        id: OrderId,
    ) -> Result<Vec<OrderProduct>, RepositoryError> {
        let sql = self.statements.sql(&PRODUCTS);
        let products = sqlx::query_as::<_, OrderProduct>(&sql)
            .bind(id)
            .fetch_all(conn)
            .await?;
        Ok(products)
    }

    /// Total lines of an order in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(
        &self,
        conn: &mut MySqlConnection,
        id: OrderId,
    ) -> Result<Vec<OrderTotal>, RepositoryError> {
        let sql = self.statements.sql(&TOTALS);
        let totals = sqlx::query_as::<_, OrderTotal>(&sql)
            .bind(id)
            .fetch_all(conn)
            .await?;
        Ok(totals)
    }

    /// Ids of orders in `status`, modified on or after `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ids_by_status(
        &self,
        conn: &mut MySqlConnection,
        status: OrderStatusId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<OrderId>, RepositoryError> {
        let sql = self.statements.sql(&IDS_BY_STATUS);
        let ids = sqlx::query_scalar::<_, OrderId>(&sql)
            .bind(status)
            .bind(from.unwrap_or_else(epoch))
            .fetch_all(conn)
            .await?;
        Ok(ids)
    }

    /// Move an order to `status` and record a history entry.
    ///
    /// Run inside a transaction; both statements belong together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or
    /// `RepositoryError::Database` if a statement fails.
    pub async fn set_status(
        &self,
        conn: &mut MySqlConnection,
        id: OrderId,
        status: OrderStatusId,
        comment: &str,
    ) -> Result<(), RepositoryError> {
        let sql = self.statements.sql(&EXISTS);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if count == 0 {
            return Err(RepositoryError::NotFound);
        }

        let sql = self.statements.sql(&SET_STATUS);
        sqlx::query(&sql)
            .bind(status)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let sql = self.statements.sql(&ADD_HISTORY);
        sqlx::query(&sql)
            .bind(id)
            .bind(status)
            .bind(comment)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_table_is_quoted() {
        let statements = Statements::new("oc_");
        let sql = statements.sql(&SET_STATUS);
        assert!(sql.starts_with("UPDATE `oc_order` SET"));
    }

    #[test]
    fn test_epoch_default() {
        assert_eq!(epoch().to_string(), "1970-01-01");
    }
}
