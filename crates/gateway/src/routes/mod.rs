//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Database ping
//!
//! # Catalog (all /api/v1 routes require a bearer token)
//! GET  /api/v1/product/{uid}            - Product lookup by UID
//! POST /api/v1/product                  - Product upsert
//! POST /api/v1/product/description      - Product description upsert
//! POST /api/v1/product/attribute        - Product attribute value upsert
//! POST /api/v1/product/special          - Product special price upsert
//! POST /api/v1/product/image            - Binary image upload
//! POST /api/v1/product/images           - Reconcile product image sets
//! POST /api/v1/category                 - Category upsert
//! POST /api/v1/category/description     - Category description upsert
//! POST /api/v1/attribute                - Attribute upsert
//!
//! # Orders and currency
//! GET  /api/v1/order/{order_id}          - Order with products and totals
//! GET  /api/v1/order/{order_id}/products - Order line items
//! POST /api/v1/order                     - Order status update
//! GET  /api/v1/orders/{status_id}?from=  - Order ids by status
//! POST /api/v1/currency                  - Currency rate update
//!
//! # Tables and batches
//! POST /api/v1/fetch                    - Guarded table read
//! POST /api/v1/delete                   - Guarded table delete
//! POST /api/v1/batch/{batch_uid}        - Finalize a batch
//! ```

pub mod batch;
pub mod catalog;
pub mod orders;
pub mod tables;

use axum::{
    Json, Router,
    routing::{get, post},
};

use ocsync_core::ApiResponse;

use crate::error::AppError;
use crate::state::AppState;

/// Handler result wrapped in the JSON envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Successful envelope around `data`.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(catalog::upsert_products))
        .route("/product/{uid}", get(catalog::product))
        .route("/product/description", post(catalog::upsert_product_descriptions))
        .route("/product/attribute", post(catalog::upsert_product_attributes))
        .route("/product/special", post(catalog::upsert_product_specials))
        .route("/product/image", post(catalog::save_images))
        .route("/product/images", post(catalog::set_images))
        .route("/category", post(catalog::upsert_categories))
        .route("/category/description", post(catalog::upsert_category_descriptions))
        .route("/attribute", post(catalog::upsert_attributes))
}

/// Create the order and currency routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(orders::set_status))
        .route("/order/{order_id}", get(orders::order))
        .route("/order/{order_id}/products", get(orders::products))
        .route("/orders/{status_id}", get(orders::ids_by_status))
        .route("/currency", post(orders::set_currency_rate))
}

/// Create the table access and batch routes router.
pub fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/fetch", post(tables::fetch))
        .route("/delete", post(tables::delete))
        .route("/batch/{batch_uid}", post(batch::finalize))
}

/// Create all API routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api/v1",
        Router::new()
            .merge(catalog_routes())
            .merge(order_routes())
            .merge(table_routes()),
    )
}
