//! Product image service.
//!
//! - [`ImageService::save_images`] ingests uploaded files and records them
//!   as the main image or an additional image row.
//! - [`ImageService::set_images`] converges a product's additional image
//!   rows onto a desired list of file UIDs already on disk.
//! - [`ImageService::collect_garbage`] removes files nothing references.

pub mod reconcile;
pub mod store;

use std::collections::HashSet;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

use ocsync_core::{ProductImageSet, ProductImageUpload};

use super::error::SyncError;
use crate::db::images::ProductImageRepository;
use crate::db::products::ProductRepository;
use crate::db::{Statements, UidResolver};
use crate::locks::KeyedLocks;

pub use reconcile::{ImagePlan, main_file_uid, plan};
pub use store::{ImageStore, basename};

/// Image ingestion and reconciliation.
#[derive(Clone)]
pub struct ImageService {
    pool: MySqlPool,
    statements: Arc<Statements>,
    locks: Arc<KeyedLocks>,
    store: ImageStore,
}

impl ImageService {
    /// Create a new image service.
    #[must_use]
    pub const fn new(
        pool: MySqlPool,
        statements: Arc<Statements>,
        locks: Arc<KeyedLocks>,
        store: ImageStore,
    ) -> Self {
        Self {
            pool,
            statements,
            locks,
            store,
        }
    }

    /// Image file store.
    #[must_use]
    pub const fn store(&self) -> &ImageStore {
        &self.store
    }

    fn resolver(&self) -> UidResolver<'_> {
        UidResolver::new(&self.pool, &self.statements, &self.locks)
    }

    /// Store uploaded images, returning their storefront paths.
    ///
    /// # Errors
    ///
    /// Returns the first failing upload's error wrapped with its file UID.
    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn save_images(&self, uploads: &[ProductImageUpload]) -> Result<Vec<String>, SyncError> {
        let mut paths = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let path = self
                .save_image(upload)
                .await
                .map_err(|e| e.for_item(&upload.file_uid))?;
            paths.push(path);
        }
        Ok(paths)
    }

    async fn save_image(&self, upload: &ProductImageUpload) -> Result<String, SyncError> {
        upload.validate()?;

        let bytes = STANDARD
            .decode(upload.file_data.trim())
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        // Same key as `set_images`.
        let _guard = self.locks.lock(&format!("images:{}", upload.product_uid)).await;

        let mut tx = self.pool.begin().await?;
        let product_id = self
            .resolver()
            .product(&mut tx, &upload.product_uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {}", upload.product_uid)))?;

        let file_name = upload.file_name();
        self.store.write(&file_name, &bytes).await?;
        let path = self.store.url(&file_name);

        if upload.is_main {
            ProductRepository::new(&self.statements)
                .set_main_image(&mut tx, product_id, &path)
                .await?;
        } else {
            ProductImageRepository::new(&self.statements)
                .upsert(&mut tx, product_id, &path, &upload.file_uid, upload.sort_order)
                .await?;
        }
        tx.commit().await?;

        debug!(
            product_uid = %upload.product_uid,
            file_uid = %upload.file_uid,
            is_main = upload.is_main,
            "Image saved"
        );
        Ok(path)
    }

    /// Reconcile several products' image sets.
    ///
    /// # Errors
    ///
    /// Returns the first failing set's error wrapped with its product UID.
    #[instrument(skip(self, sets), fields(count = sets.len()))]
    pub async fn set_images_batch(&self, sets: &[ProductImageSet]) -> Result<Vec<String>, SyncError> {
        let mut present = Vec::new();
        for set in sets {
            let mut known = self.set_images(set).await.map_err(|e| e.for_item(&set.uid))?;
            present.append(&mut known);
        }
        Ok(present)
    }

    /// Converge a product's additional images onto `set.images`.
    ///
    /// Returns the file UIDs that were already stored. Every file to insert
    /// must already be on disk; otherwise nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` for an unknown product,
    /// `SyncError::FileNotFound` for a file UID with no file on disk, or
    /// `SyncError::Database` if a statement fails.
    #[instrument(skip(self, set), fields(product_uid = %set.uid))]
    pub async fn set_images(&self, set: &ProductImageSet) -> Result<Vec<String>, SyncError> {
        set.validate()?;

        let _guard = self.locks.lock(&format!("images:{}", set.uid)).await;

        let images = ProductImageRepository::new(&self.statements);
        let mut tx = self.pool.begin().await?;

        let product_id = self
            .resolver()
            .product(&mut tx, &set.uid)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("product {}", set.uid)))?;

        let main_image = ProductRepository::new(&self.statements)
            .main_image(&mut tx, product_id)
            .await?;
        let main_file = main_image.as_deref().and_then(basename);

        let existing = images.list(&mut tx, product_id).await?;
        let plan = plan(&existing, &set.images, main_file);

        let mut inserts = Vec::with_capacity(plan.insert.len());
        for (file_uid, sort_order) in &plan.insert {
            let file_name = self
                .store
                .find(file_uid)
                .await?
                .ok_or_else(|| SyncError::FileNotFound(file_uid.clone()))?;
            inserts.push((file_uid, self.store.url(&file_name), *sort_order));
        }

        let deleted = images.delete_rows(&mut tx, &plan.delete).await?;
        for (file_uid, path, sort_order) in &inserts {
            images
                .insert(&mut tx, product_id, path, file_uid, *sort_order)
                .await?;
        }

        tx.commit().await?;

        info!(
            deleted,
            inserted = inserts.len(),
            present = plan.present.len(),
            "Images reconciled"
        );
        Ok(plan.present)
    }

    /// Delete image files referenced by no product or image row.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Database` if the references cannot be loaded, or
    /// `SyncError::Io` if walking the directory or deleting a file fails.
    #[instrument(skip(self))]
    pub async fn collect_garbage(&self) -> Result<u64, SyncError> {
        let paths = {
            let mut conn = self.pool.acquire().await?;
            ProductImageRepository::new(&self.statements)
                .referenced_paths(&mut conn)
                .await?
        };

        let referenced: HashSet<String> = paths
            .iter()
            .filter_map(|path| basename(path))
            .map(ToString::to_string)
            .collect();

        let deleted = self.store.collect_garbage(&referenced).await?;
        Ok(deleted)
    }
}
