//! Batch lifecycle.
//!
//! A full catalog push tags every product it writes with a batch UID.
//! Finalizing the batch makes that set the active catalog:
//!
//! 1. Refuse if nothing carries the tag, so an aborted push cannot disable
//!    the whole catalog.
//! 2. Disable every product without the tag.
//! 3. Clear all tags.
//!
//! The three steps run in one transaction. Orphan image cleanup and the
//! Slack notification follow a successful commit.

use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::{error, info, instrument, warn};

use ocsync_core::BatchResult;

use super::error::SyncError;
use super::images::ImageService;
use crate::db::{BatchRepository, CategoryRepository, Statements};
use crate::slack::{SlackClient, build_batch_failed_message, build_batch_finalized_message};

/// Counts after a successful finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeCounts {
    pub deactivated: u64,
    pub active_products: i64,
    pub active_categories: i64,
}

/// Batch finalize service.
#[derive(Clone)]
pub struct BatchService {
    pool: MySqlPool,
    statements: Arc<Statements>,
    images: ImageService,
    slack: Option<SlackClient>,
    host: String,
}

impl BatchService {
    /// Create a new batch service.
    #[must_use]
    pub const fn new(
        pool: MySqlPool,
        statements: Arc<Statements>,
        images: ImageService,
        slack: Option<SlackClient>,
        host: String,
    ) -> Self {
        Self {
            pool,
            statements,
            images,
            slack,
            host,
        }
    }

    /// Make `batch_uid` the active catalog, then remove orphan images.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::EmptyBatch` if no product carries the tag (nothing
    /// is changed), `SyncError::Database` if a step fails (the transaction is
    /// rolled back), or the garbage collection error after a committed
    /// finalize.
    #[instrument(skip(self))]
    pub async fn finalize(&self, batch_uid: &str) -> Result<BatchResult, SyncError> {
        let result = self.finalize_inner(batch_uid).await;

        match &result {
            Ok(summary) => {
                self.notify(
                    build_batch_finalized_message(summary, &self.host),
                    "Catalog sync finalized",
                )
                .await;
            }
            Err(e) => {
                self.notify(
                    build_batch_failed_message(batch_uid, &e.to_string(), &self.host),
                    "Catalog sync not finalized",
                )
                .await;
            }
        }

        result
    }

    async fn finalize_inner(&self, batch_uid: &str) -> Result<BatchResult, SyncError> {
        let counts = self.apply(batch_uid).await?;
        let deleted_files = self.images.collect_garbage().await?;

        info!(
            batch_uid,
            deactivated = counts.deactivated,
            active_products = counts.active_products,
            active_categories = counts.active_categories,
            deleted_files,
            "Batch finalized"
        );

        Ok(BatchResult::finished(
            batch_uid,
            counts.active_products,
            counts.active_categories,
            deleted_files,
        ))
    }

    /// Run the finalize transaction without image cleanup.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` for an empty UID,
    /// `SyncError::EmptyBatch` if no product carries the tag, or
    /// `SyncError::Database` if a step fails.
    pub async fn apply(&self, batch_uid: &str) -> Result<FinalizeCounts, SyncError> {
        if batch_uid.trim().is_empty() {
            return Err(SyncError::Validation("batch_uid cannot be empty".to_string()));
        }

        let batches = BatchRepository::new(&self.statements);
        let mut tx = self.pool.begin().await?;

        let tagged = batches.count_tagged(&mut tx, batch_uid).await?;
        if tagged == 0 {
            warn!(batch_uid, "Refusing to finalize empty batch");
            return Err(SyncError::EmptyBatch(batch_uid.to_string()));
        }

        let deactivated = batches.deactivate_untagged(&mut tx, batch_uid).await?;
        batches.clear_tags(&mut tx).await?;
        let active_products = batches.count_active_products(&mut tx).await?;
        let active_categories = CategoryRepository::new(&self.statements)
            .count_active(&mut tx)
            .await?;

        tx.commit().await?;

        Ok(FinalizeCounts {
            deactivated,
            active_products,
            active_categories,
        })
    }

    async fn notify(&self, blocks: Vec<crate::slack::Block>, fallback: &str) {
        let Some(slack) = &self.slack else {
            return;
        };
        if let Err(e) = slack.notify(blocks, fallback).await {
            error!(error = %e, "Failed to send batch notification");
        }
    }
}
