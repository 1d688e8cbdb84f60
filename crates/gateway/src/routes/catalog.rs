//! Product, category and attribute handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::{debug, info};

use ocsync_core::{
    AttributeData, CategoryData, CategoryDescription, DataRequest, ProductAttribute, ProductData,
    ProductDescription, ProductImageSet, ProductImageUpload, ProductRecord, ProductSpecial,
    Upserted,
};

use super::{ApiResult, ok};
use crate::middleware::RequireApiKey;
use crate::state::AppState;

/// Look up a product by UID.
pub async fn product(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    uid: Result<Path<String>, PathRejection>,
) -> ApiResult<ProductRecord> {
    let Path(uid) = uid?;
    ok(state.catalog().product(&uid).await?)
}

/// Upsert products and their category links.
pub async fn upsert_products(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductData>>, JsonRejection>,
) -> ApiResult<Vec<Upserted>> {
    let Json(request) = body?;
    debug!(
        full = request.full,
        page = request.page,
        total = request.total,
        size = request.data.len(),
        "Product page received"
    );

    let upserted = state.catalog().upsert_products(&request.data).await?;
    info!(
        size = upserted.len(),
        created = upserted.iter().filter(|u| u.created).count(),
        "Products saved"
    );
    ok(upserted)
}

pub async fn upsert_product_descriptions(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductDescription>>, JsonRejection>,
) -> ApiResult<usize> {
    let Json(request) = body?;
    ok(state
        .catalog()
        .upsert_product_descriptions(&request.data)
        .await?)
}

pub async fn upsert_product_attributes(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductAttribute>>, JsonRejection>,
) -> ApiResult<usize> {
    let Json(request) = body?;
    ok(state
        .catalog()
        .upsert_product_attributes(&request.data)
        .await?)
}

pub async fn upsert_product_specials(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductSpecial>>, JsonRejection>,
) -> ApiResult<usize> {
    let Json(request) = body?;
    ok(state.catalog().upsert_product_specials(&request.data).await?)
}

/// Store uploaded image files; returns their storefront paths.
pub async fn save_images(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductImageUpload>>, JsonRejection>,
) -> ApiResult<Vec<String>> {
    let Json(request) = body?;
    let paths = state.images().save_images(&request.data).await?;
    info!(size = paths.len(), "Product images saved");
    ok(paths)
}

/// Reconcile each listed product's images with its desired set; returns the
/// file UIDs that were already stored.
pub async fn set_images(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<ProductImageSet>>, JsonRejection>,
) -> ApiResult<Vec<String>> {
    let Json(request) = body?;
    let present = state.images().set_images_batch(&request.data).await?;
    info!(
        products = request.data.len(),
        already_present = present.len(),
        "Product images set"
    );
    ok(present)
}

pub async fn upsert_categories(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<CategoryData>>, JsonRejection>,
) -> ApiResult<Vec<Upserted>> {
    let Json(request) = body?;
    let upserted = state.catalog().upsert_categories(&request.data).await?;
    info!(size = upserted.len(), "Categories saved");
    ok(upserted)
}

pub async fn upsert_category_descriptions(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<CategoryDescription>>, JsonRejection>,
) -> ApiResult<usize> {
    let Json(request) = body?;
    ok(state
        .catalog()
        .upsert_category_descriptions(&request.data)
        .await?)
}

pub async fn upsert_attributes(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<DataRequest<AttributeData>>, JsonRejection>,
) -> ApiResult<Vec<Upserted>> {
    let Json(request) = body?;
    let upserted = state.catalog().upsert_attributes(&request.data).await?;
    info!(size = upserted.len(), "Attributes saved");
    ok(upserted)
}
