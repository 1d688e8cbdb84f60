//! Catalog upserts.
//!
//! Each payload kind follows the same shape: resolve the owner UIDs, then
//! insert or update the row and its dependents inside one transaction.
//! List calls process items in order and stop at the first failure, which
//! is returned wrapped with the failing item's UID.
//!
//! Categories and manufacturers referenced by a product are resolved (and
//! created if unknown) before the product transaction opens; stub rows are
//! committed on their own connection.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

use ocsync_core::{
    AttributeData, CategoryData, CategoryDescription, CategoryId, CustomField, ProductAttribute,
    ProductData, ProductDescription, ProductRecord, ProductSpecial, ProductStatus, StockStatus,
    Upserted,
};

use super::error::SyncError;
use crate::db::attributes::AttributeRepository;
use crate::db::categories::{CategoryRepository, CategoryWrite};
use crate::db::products::{ProductRepository, ProductWrite, SpecialWrite};
use crate::db::{Statements, UidResolver};
use crate::locks::KeyedLocks;

/// Days a new product's availability date is backdated.
const AVAILABLE_BACKDATE_DAYS: u64 = 3;

/// Settings that shape product writes.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Product columns that may be set through `custom_fields`.
    pub custom_fields: Vec<String>,
    /// Tax class for newly created products.
    pub tax_class_id: i32,
}

/// Availability date for a product created on `today`.
fn date_available(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(AVAILABLE_BACKDATE_DAYS))
        .unwrap_or(today)
}

/// Reject custom fields whose name is not on the allow-list.
fn check_custom_fields(allowed: &[String], fields: &[CustomField]) -> Result<(), SyncError> {
    match fields
        .iter()
        .find(|field| !allowed.iter().any(|name| name == &field.name))
    {
        Some(field) => Err(SyncError::Validation(format!(
            "custom field `{}` is not allowed",
            field.name
        ))),
        None => Ok(()),
    }
}

/// Catalog upsert service.
#[derive(Clone)]
pub struct CatalogService {
    pool: MySqlPool,
    statements: Arc<Statements>,
    locks: Arc<KeyedLocks>,
    settings: Arc<CatalogSettings>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(
        pool: MySqlPool,
        statements: Arc<Statements>,
        locks: Arc<KeyedLocks>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            pool,
            statements,
            locks,
            settings: Arc::new(settings),
        }
    }

    fn resolver(&self) -> UidResolver<'_> {
        UidResolver::new(&self.pool, &self.statements, &self.locks)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Look up a product by UID.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the UID is unknown.
    #[instrument(skip(self))]
    pub async fn product(&self, uid: &str) -> Result<ProductRecord, SyncError> {
        let mut conn = self.pool.acquire().await?;
        ProductRepository::new(&self.statements)
            .find_by_uid(&mut conn, uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {uid}")))
    }

    /// Upsert products in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its UID.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn upsert_products(&self, products: &[ProductData]) -> Result<Vec<Upserted>, SyncError> {
        let mut results = Vec::with_capacity(products.len());
        for product in products {
            let result = self
                .upsert_product(product)
                .await
                .map_err(|e| e.for_item(&product.uid))?;
            results.push(result);
        }
        info!(count = results.len(), "Products upserted");
        Ok(results)
    }

    /// Insert or update one product, its category links and custom fields.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` for a malformed payload or a custom
    /// field outside the allow-list, or `SyncError::Database` if a statement
    /// fails (the product transaction is rolled back).
    pub async fn upsert_product(&self, data: &ProductData) -> Result<Upserted, SyncError> {
        data.validate()?;
        check_custom_fields(&self.settings.custom_fields, &data.custom_fields)?;

        let resolver = self.resolver();
        let manufacturer_id = resolver.manufacturer_or_create(&data.manufacturer).await?;
        let category_ids = resolver.categories_or_create(&data.categories).await?;

        let _guard = self.locks.lock(&format!("product:{}", data.uid)).await;

        let products = ProductRepository::new(&self.statements);
        let mut tx = self.pool.begin().await?;

        let existing = products.find_id_by_uid(&mut tx, &data.uid).await?;
        let quantity = if existing.is_some() {
            data.quantity
        } else {
            data.initial_quantity()
        };

        let write = ProductWrite {
            uid: &data.uid,
            sku: &data.article,
            quantity,
            stock_status_id: StockStatus::from_quantity(quantity).code(),
            manufacturer_id,
            price: data.price,
            weight: data.weight,
            weight_class_id: data.weight_class_id,
            status: ProductStatus::from_active(data.active).code(),
            batch_uid: &data.batch_uid,
        };

        let (id, created) = match existing {
            Some(id) => {
                products.update(&mut tx, id, &write).await?;
                (id, false)
            }
            None => {
                let today = Utc::now().date_naive();
                let id = products
                    .insert(
                        &mut tx,
                        &write,
                        date_available(today),
                        self.settings.tax_class_id,
                    )
                    .await?;
                products.link_defaults(&mut tx, id).await?;
                (id, true)
            }
        };

        products.replace_categories(&mut tx, id, &category_ids).await?;

        for field in &data.custom_fields {
            products
                .set_custom_field(&mut tx, id, &field.name, &field.value)
                .await?;
        }

        tx.commit().await?;

        debug!(product_uid = %data.uid, product_id = %id, created, "Product upserted");
        Ok(Upserted::new(&data.uid, id.as_i32(), created))
    }

    /// Upsert product descriptions.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its product UID.
    #[instrument(skip(self, descriptions), fields(count = descriptions.len()))]
    pub async fn upsert_product_descriptions(
        &self,
        descriptions: &[ProductDescription],
    ) -> Result<usize, SyncError> {
        for description in descriptions {
            self.upsert_product_description(description)
                .await
                .map_err(|e| e.for_item(&description.product_uid))?;
        }
        Ok(descriptions.len())
    }

    async fn upsert_product_description(&self, data: &ProductDescription) -> Result<(), SyncError> {
        data.validate()?;

        let products = ProductRepository::new(&self.statements);
        let mut tx = self.pool.begin().await?;

        let id = self
            .resolver()
            .product(&mut tx, &data.product_uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {}", data.product_uid)))?;

        if products
            .description_exists(&mut tx, id, data.language_id)
            .await?
        {
            let body = data.replaces_body().then_some(data.description.as_str());
            products
                .update_description(&mut tx, id, data.language_id, &data.name, body)
                .await?;
        } else {
            products
                .insert_description(&mut tx, id, data.language_id, &data.name, &data.description)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Upsert product attribute values.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its product UID.
    #[instrument(skip(self, values), fields(count = values.len()))]
    pub async fn upsert_product_attributes(
        &self,
        values: &[ProductAttribute],
    ) -> Result<usize, SyncError> {
        for value in values {
            self.upsert_product_attribute(value)
                .await
                .map_err(|e| e.for_item(&value.product_uid))?;
        }
        Ok(values.len())
    }

    async fn upsert_product_attribute(&self, data: &ProductAttribute) -> Result<(), SyncError> {
        data.validate()?;

        let resolver = self.resolver();
        let mut tx = self.pool.begin().await?;

        let product_id = resolver
            .product(&mut tx, &data.product_uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {}", data.product_uid)))?;
        let attribute_id = resolver
            .attribute(&mut tx, &data.attribute_uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("attribute {}", data.attribute_uid)))?;

        ProductRepository::new(&self.statements)
            .upsert_attribute_value(&mut tx, product_id, attribute_id, data.language_id, &data.text)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Upsert product specials, one row per (product, customer group).
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its product UID.
    #[instrument(skip(self, specials), fields(count = specials.len()))]
    pub async fn upsert_product_specials(&self, specials: &[ProductSpecial]) -> Result<usize, SyncError> {
        for special in specials {
            self.upsert_product_special(special)
                .await
                .map_err(|e| e.for_item(&special.product_uid))?;
        }
        Ok(specials.len())
    }

    async fn upsert_product_special(&self, data: &ProductSpecial) -> Result<(), SyncError> {
        data.validate()?;

        let mut tx = self.pool.begin().await?;

        let id = self
            .resolver()
            .product(&mut tx, &data.product_uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {}", data.product_uid)))?;

        let special = SpecialWrite {
            group_id: data.group_id,
            priority: data.priority,
            price: data.price,
            date_start: data.date_start,
            date_end: data.date_end,
        };
        ProductRepository::new(&self.statements)
            .upsert_special(&mut tx, id, &special)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Upsert categories. Unknown parents are created as stubs.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its UID.
    #[instrument(skip(self, categories), fields(count = categories.len()))]
    pub async fn upsert_categories(
        &self,
        categories: &[CategoryData],
    ) -> Result<Vec<Upserted>, SyncError> {
        let mut results = Vec::with_capacity(categories.len());
        for category in categories {
            let result = self
                .upsert_category(category)
                .await
                .map_err(|e| e.for_item(&category.uid))?;
            results.push(result);
        }
        info!(count = results.len(), "Categories upserted");
        Ok(results)
    }

    async fn upsert_category(&self, data: &CategoryData) -> Result<Upserted, SyncError> {
        data.validate()?;

        let categories = CategoryRepository::new(&self.statements);
        let resolver = self.resolver();

        let known = {
            let mut conn = self.pool.acquire().await?;
            categories.find_id_by_uid(&mut conn, &data.uid).await?
        };

        let parent_id = resolver
            .category_or_create(&data.parent_uid)
            .await?
            .unwrap_or(CategoryId::new(0));
        let id = match known {
            Some(id) => id,
            None => resolver
                .category_or_create(&data.uid)
                .await?
                .ok_or_else(|| SyncError::Validation("uid cannot be empty".to_string()))?,
        };

        let write = CategoryWrite {
            parent_id,
            parent_uid: &data.parent_uid,
            top: data.menu,
            sort_order: data.sort_order,
            status: data.active,
        };
        // Row stubs above commit on their own; the field write is serialized
        // per category and runs in its own transaction.
        let _guard = self.locks.lock(&format!("category-fields:{}", data.uid)).await;
        let mut tx = self.pool.begin().await?;
        categories.update(&mut tx, id, &write).await?;
        tx.commit().await?;

        debug!(category_uid = %data.uid, category_id = %id, "Category upserted");
        Ok(Upserted::new(&data.uid, id.as_i32(), known.is_none()))
    }

    /// Upsert category descriptions. An unknown category is created as a
    /// stub first.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its category UID.
    #[instrument(skip(self, descriptions), fields(count = descriptions.len()))]
    pub async fn upsert_category_descriptions(
        &self,
        descriptions: &[CategoryDescription],
    ) -> Result<usize, SyncError> {
        for description in descriptions {
            self.upsert_category_description(description)
                .await
                .map_err(|e| e.for_item(&description.category_uid))?;
        }
        Ok(descriptions.len())
    }

    async fn upsert_category_description(&self, data: &CategoryDescription) -> Result<(), SyncError> {
        data.validate()?;

        let id = self
            .resolver()
            .category_or_create(&data.category_uid)
            .await?
            .ok_or_else(|| SyncError::Validation("category_uid cannot be empty".to_string()))?;

        let mut tx = self.pool.begin().await?;
        CategoryRepository::new(&self.statements)
            .upsert_description(&mut tx, id, data.language_id, &data.name, &data.description)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Upsert attributes with their descriptions.
    ///
    /// # Errors
    ///
    /// Returns the first failing item's error wrapped with its UID.
    #[instrument(skip(self, attributes), fields(count = attributes.len()))]
    pub async fn upsert_attributes(
        &self,
        attributes: &[AttributeData],
    ) -> Result<Vec<Upserted>, SyncError> {
        let mut results = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let result = self
                .upsert_attribute(attribute)
                .await
                .map_err(|e| e.for_item(&attribute.uid))?;
            results.push(result);
        }
        Ok(results)
    }

    async fn upsert_attribute(&self, data: &AttributeData) -> Result<Upserted, SyncError> {
        data.validate()?;

        let _guard = self.locks.lock(&format!("attribute:{}", data.uid)).await;

        let attributes = AttributeRepository::new(&self.statements);
        let mut tx = self.pool.begin().await?;

        let existing = attributes.find_id_by_uid(&mut tx, &data.uid).await?;
        let (id, created) = match existing {
            Some(id) => {
                attributes
                    .update(&mut tx, id, data.group_id, data.sort_order)
                    .await?;
                (id, false)
            }
            None => {
                let id = attributes
                    .insert(&mut tx, &data.uid, data.group_id, data.sort_order)
                    .await?;
                (id, true)
            }
        };

        for description in &data.descriptions {
            attributes
                .upsert_description(&mut tx, id, description.language_id, &description.name)
                .await?;
        }

        tx.commit().await?;
        Ok(Upserted::new(&data.uid, id.as_i32(), created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> CustomField {
        CustomField {
            name: name.to_string(),
            value: "x".to_string(),
        }
    }

    #[test]
    fn test_date_available_is_backdated() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap_or_default();
        assert_eq!(
            date_available(today),
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap_or_default()
        );
    }

    #[test]
    fn test_custom_fields_allow_list() {
        let allowed = vec!["upc".to_string(), "ean".to_string()];
        assert!(check_custom_fields(&allowed, &[]).is_ok());
        assert!(check_custom_fields(&allowed, &[field("upc"), field("ean")]).is_ok());

        let err = check_custom_fields(&allowed, &[field("upc"), field("price")]);
        assert!(matches!(err, Err(SyncError::Validation(msg)) if msg.contains("price")));
    }

    #[test]
    fn test_custom_fields_rejected_when_none_allowed() {
        assert!(check_custom_fields(&[], &[field("upc")]).is_err());
    }
}
