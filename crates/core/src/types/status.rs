//! Status codes stored on storefront rows.
//!
//! The storefront keeps statuses as plain integers; these enums give the
//! values we write a name and derive them from the incoming catalog data.

use serde::{Deserialize, Serialize};

/// Product visibility (`product.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Disabled,
    Enabled,
}

impl ProductStatus {
    /// Status derived from the client's active flag.
    #[must_use]
    pub const fn from_active(active: bool) -> Self {
        if active { Self::Enabled } else { Self::Disabled }
    }

    /// Integer value stored in the `status` column.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
        }
    }
}

/// Stock status shown when a product has no quantity (`product.stock_status_id`).
///
/// Values are the ids of the stock status rows shipped with a default
/// storefront install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    InStock,
}

impl StockStatus {
    /// In stock iff quantity is positive.
    #[must_use]
    pub const fn from_quantity(quantity: i32) -> Self {
        if quantity > 0 {
            Self::InStock
        } else {
            Self::OutOfStock
        }
    }

    /// Integer value stored in the `stock_status_id` column.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::OutOfStock => 5,
            Self::InStock => 7,
        }
    }

    /// Map a stored `stock_status_id` back to a known status.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            5 => Some(Self::OutOfStock),
            7 => Some(Self::InStock),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfStock => write!(f, "out_of_stock"),
            Self::InStock => write!(f, "in_stock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_from_active() {
        assert_eq!(ProductStatus::from_active(true).code(), 1);
        assert_eq!(ProductStatus::from_active(false).code(), 0);
    }

    #[test]
    fn test_stock_status_from_quantity() {
        assert_eq!(StockStatus::from_quantity(3), StockStatus::InStock);
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(-2), StockStatus::OutOfStock);
    }

    #[test]
    fn test_stock_status_codes() {
        assert_eq!(StockStatus::InStock.code(), 7);
        assert_eq!(StockStatus::OutOfStock.code(), 5);
        assert_eq!(StockStatus::from_code(7), Some(StockStatus::InStock));
        assert_eq!(StockStatus::from_code(1), None);
    }
}
