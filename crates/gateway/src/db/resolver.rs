//! External UID to internal id resolution.
//!
//! Products and attributes are pure lookups. Categories and manufacturers
//! are get-or-create: an unknown UID (or name) produces a stub row that is
//! committed immediately, outside any caller transaction, so concurrent
//! payloads referencing the same UID all see the same row. Creation is
//! serialized per key with [`KeyedLocks`] and re-checks after taking the
//! lock.

use sqlx::{Connection, MySqlConnection, MySqlPool};
use tracing::{debug, info};

use ocsync_core::{AttributeId, CategoryId, ManufacturerId, ProductId};

use super::RepositoryError;
use super::attributes::AttributeRepository;
use super::categories::CategoryRepository;
use super::manufacturers::ManufacturerRepository;
use super::products::ProductRepository;
use super::statements::Statements;
use crate::locks::KeyedLocks;

/// Resolves UIDs against the storefront tables.
pub struct UidResolver<'a> {
    pool: &'a MySqlPool,
    statements: &'a Statements,
    locks: &'a KeyedLocks,
}

impl<'a> UidResolver<'a> {
    /// Create a resolver.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool, statements: &'a Statements, locks: &'a KeyedLocks) -> Self {
        Self {
            pool,
            statements,
            locks,
        }
    }

    /// Internal id of a product. Never creates; an empty UID resolves to
    /// `None` without a query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn product(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<ProductId>, RepositoryError> {
        if uid.is_empty() {
            return Ok(None);
        }
        ProductRepository::new(self.statements)
            .find_id_by_uid(conn, uid)
            .await
    }

    /// Internal id of an attribute. Never creates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn attribute(
        &self,
        conn: &mut MySqlConnection,
        uid: &str,
    ) -> Result<Option<AttributeId>, RepositoryError> {
        if uid.is_empty() {
            return Ok(None);
        }
        AttributeRepository::new(self.statements)
            .find_id_by_uid(conn, uid)
            .await
    }

    /// Internal id of a category, creating a disabled stub if the UID is
    /// unknown. An empty UID means "no category" and resolves to `None`
    /// without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a lookup or insert fails.
    pub async fn category_or_create(&self, uid: &str) -> Result<Option<CategoryId>, RepositoryError> {
        if uid.is_empty() {
            return Ok(None);
        }

        let categories = CategoryRepository::new(self.statements);
        let mut conn = self.pool.acquire().await?;

        if let Some(id) = categories.find_id_by_uid(&mut conn, uid).await? {
            return Ok(Some(id));
        }

        let _guard = self.locks.lock(&format!("category:{uid}")).await;

        // Another request may have created it while we waited.
        if let Some(id) = categories.find_id_by_uid(&mut conn, uid).await? {
            debug!(category_uid = %uid, "Category created concurrently");
            return Ok(Some(id));
        }

        let mut tx = conn.begin().await?;
        let id = categories.insert_stub(&mut tx, uid).await?;
        tx.commit().await?;
        info!(category_uid = %uid, category_id = %id, "Created category stub");
        Ok(Some(id))
    }

    /// Resolve a list of category UIDs, dropping empties and duplicates
    /// while keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a lookup or insert fails.
    pub async fn categories_or_create(
        &self,
        uids: &[String],
    ) -> Result<Vec<CategoryId>, RepositoryError> {
        let mut ids = Vec::with_capacity(uids.len());
        for uid in uids {
            if let Some(id) = self.category_or_create(uid).await?
                && !ids.contains(&id)
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Manufacturer id for a name, creating it if unknown. An empty name
    /// resolves to id 0 ("no manufacturer") without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a lookup or insert fails.
    pub async fn manufacturer_or_create(&self, name: &str) -> Result<ManufacturerId, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(ManufacturerId::new(0));
        }

        let manufacturers = ManufacturerRepository::new(self.statements);
        let mut conn = self.pool.acquire().await?;

        if let Some(id) = manufacturers.find_by_name(&mut conn, name).await? {
            return Ok(id);
        }

        let _guard = self.locks.lock(&format!("manufacturer:{}", name.to_lowercase())).await;

        if let Some(id) = manufacturers.find_by_name(&mut conn, name).await? {
            return Ok(id);
        }

        let mut tx = conn.begin().await?;
        let id = manufacturers.insert(&mut tx, name).await?;
        tx.commit().await?;
        info!(manufacturer = %name, manufacturer_id = %id, "Created manufacturer");
        Ok(id)
    }
}
