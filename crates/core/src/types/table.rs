//! Generic table access requests and the product lookup record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ManufacturerId, ProductId};

/// Read rows from a whitelisted storefront table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub table: String,
    /// Free-text `WHERE` clause, screened before use.
    #[serde(default)]
    pub filter: String,
    /// Row limit; zero or anything above the server ceiling uses the ceiling.
    #[serde(default)]
    pub limit: u32,
    /// Return binary columns as stored instead of base64-decoding them.
    #[serde(default)]
    pub plain: bool,
}

/// Delete rows from a whitelisted storefront table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub table: String,
    pub filter: String,
}

/// Product row as seen by the catalog-management process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub uid: String,
    pub article: String,
    pub quantity: i32,
    pub stock_status_id: i32,
    pub image: Option<String>,
    pub manufacturer_id: ManufacturerId,
    pub price: Decimal,
    pub status: bool,
    pub batch_uid: Option<String>,
    pub date_modified: NaiveDateTime,
}
