//! Core types for the catalog gateway.
//!
//! This module provides type-safe wrappers and payloads for the catalog,
//! order, and table-access operations.

pub mod catalog;
pub mod envelope;
pub mod id;
pub mod order;
pub mod price;
pub mod status;
pub mod table;

pub use catalog::*;
pub use envelope::{ApiResponse, DataRequest};
pub use id::*;
pub use order::*;
pub use price::{CurrencyCode, CurrencyError, CurrencyRate};
pub use status::*;
pub use table::*;
