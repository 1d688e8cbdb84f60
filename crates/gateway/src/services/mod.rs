//! Business logic services for the gateway.
//!
//! # Services
//!
//! - `auth` - API token authentication with a TTL cache
//! - `batch` - Batch finalize and post-finalize cleanup
//! - `catalog` - Product, category and attribute upserts
//! - `currency` - Exchange rate updates
//! - `images` - Image ingestion, reconciliation and garbage collection
//! - `orders` - Order lookups and status changes

pub mod auth;
pub mod batch;
pub mod catalog;
pub mod currency;
pub mod error;
pub mod images;
pub mod orders;

pub use auth::{ApiKeyStore, AuthCache, AuthError, DbKeyStore};
pub use batch::{BatchService, FinalizeCounts};
pub use catalog::{CatalogService, CatalogSettings};
pub use currency::CurrencyService;
pub use error::{ErrorKind, SyncError};
pub use images::{ImageService, ImageStore};
pub use orders::OrderService;
