//! Order read models returned to the catalog-management process.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::PayloadError;
use super::id::{OrderId, OrderStatusId, ProductId};

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct Order {
    pub order_id: OrderId,
    pub invoice_no: i32,
    pub invoice_prefix: String,
    pub store_id: i32,
    pub store_name: String,
    pub customer_id: i32,
    pub customer_group_id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub telephone: String,
    pub payment_firstname: String,
    pub payment_lastname: String,
    pub payment_company: String,
    pub payment_address_1: String,
    pub payment_address_2: String,
    pub payment_city: String,
    pub payment_postcode: String,
    pub payment_country: String,
    pub payment_zone: String,
    pub payment_method: String,
    pub payment_code: String,
    pub shipping_firstname: String,
    pub shipping_lastname: String,
    pub shipping_company: String,
    pub shipping_address_1: String,
    pub shipping_address_2: String,
    pub shipping_city: String,
    pub shipping_postcode: String,
    pub shipping_country: String,
    pub shipping_zone: String,
    pub shipping_method: String,
    pub shipping_code: String,
    pub comment: String,
    pub total: Decimal,
    pub order_status_id: OrderStatusId,
    pub language_id: i32,
    pub currency_id: i32,
    pub currency_code: String,
    pub currency_value: Decimal,
    pub date_added: NaiveDateTime,
    pub date_modified: NaiveDateTime,
}

/// Order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct OrderProduct {
    pub order_product_id: i32,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    /// Product UID at the time of ordering.
    pub model: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
    pub tax: Decimal,
    pub reward: i32,
}

/// Order total line (subtotal, shipping, tax, total).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct OrderTotal {
    pub order_total_id: i32,
    pub order_id: OrderId,
    pub code: String,
    pub title: String,
    pub value: Decimal,
    pub sort_order: i32,
}

/// Order with line items and totals.
///
/// Line items and totals are best effort: if loading them fails the header
/// is still returned with the list left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub products: Vec<OrderProduct>,
    pub totals: Vec<OrderTotal>,
}

/// Order status change with a history comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub order_id: OrderId,
    pub order_status_id: OrderStatusId,
    #[serde(default)]
    pub comment: String,
}

impl OrderStatusUpdate {
    /// # Errors
    ///
    /// Returns an error if either id is not positive.
    pub const fn validate(&self) -> Result<(), PayloadError> {
        if self.order_id.as_i32() <= 0 {
            return Err(PayloadError::OutOfRange {
                field: "order_id",
                reason: "must be positive",
            });
        }
        if self.order_status_id.as_i32() <= 0 {
            return Err(PayloadError::OutOfRange {
                field: "order_status_id",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Filter for searching orders by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusQuery {
    pub order_status_id: OrderStatusId,
    /// Only orders modified on or after this date.
    #[serde(default)]
    pub from: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_validate() {
        let ok = OrderStatusUpdate {
            order_id: OrderId::new(10),
            order_status_id: OrderStatusId::new(5),
            comment: String::new(),
        };
        assert!(ok.validate().is_ok());

        let bad = OrderStatusUpdate {
            order_id: OrderId::new(0),
            ..ok
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_status_update_comment_optional() {
        let update: Result<OrderStatusUpdate, _> =
            serde_json::from_str(r#"{"order_id":1,"order_status_id":2}"#);
        assert!(update.is_ok_and(|u| u.comment.is_empty()));
    }
}
