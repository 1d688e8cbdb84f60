//! Order lookups and status changes.

use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::{info, instrument, warn};

use ocsync_core::{
    Order, OrderDetails, OrderId, OrderProduct, OrderStatusQuery, OrderStatusUpdate,
};

use super::error::SyncError;
use crate::db::{OrderRepository, RepositoryError, Statements};

/// Order service.
#[derive(Clone)]
pub struct OrderService {
    pool: MySqlPool,
    statements: Arc<Statements>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: MySqlPool, statements: Arc<Statements>) -> Self {
        Self { pool, statements }
    }

    async fn header(&self, id: OrderId) -> Result<Order, SyncError> {
        let mut conn = self.pool.acquire().await?;
        OrderRepository::new(&self.statements)
            .find(&mut conn, id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("order {id}")))
    }

    /// Order header with line items and totals.
    ///
    /// Line items and totals that fail to load are logged and left empty.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<OrderDetails, SyncError> {
        let order = self.header(id).await?;

        let orders = OrderRepository::new(&self.statements);
        let mut conn = self.pool.acquire().await?;

        let products = orders.products(&mut conn, id).await.unwrap_or_else(|e| {
            warn!(error = %e, order_id = %id, "Failed to load order products");
            Vec::new()
        });
        let totals = orders.totals(&mut conn, id).await.unwrap_or_else(|e| {
            warn!(error = %e, order_id = %id, "Failed to load order totals");
            Vec::new()
        });

        Ok(OrderDetails {
            order,
            products,
            totals,
        })
    }

    /// Line items of an existing order.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn products(&self, id: OrderId) -> Result<Vec<OrderProduct>, SyncError> {
        self.header(id).await?;
        let mut conn = self.pool.acquire().await?;
        let products = OrderRepository::new(&self.statements)
            .products(&mut conn, id)
            .await?;
        Ok(products)
    }

    /// Ids of orders in a status, optionally modified since a date.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn ids_by_status(&self, query: OrderStatusQuery) -> Result<Vec<OrderId>, SyncError> {
        let mut conn = self.pool.acquire().await?;
        let ids = OrderRepository::new(&self.statements)
            .ids_by_status(&mut conn, query.order_status_id, query.from)
            .await?;
        Ok(ids)
    }

    /// Move an order to a new status and record the change in its history.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` if the order does not exist, or
    /// `SyncError::Database` if a statement fails.
    #[instrument(skip(self, update), fields(order_id = %update.order_id))]
    pub async fn set_status(&self, update: &OrderStatusUpdate) -> Result<(), SyncError> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;
        match OrderRepository::new(&self.statements)
            .set_status(&mut tx, update.order_id, update.order_status_id, &update.comment)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                return Err(SyncError::NotFound(format!("order {}", update.order_id)));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        info!(
            order_status_id = %update.order_status_id,
            "Order status updated"
        );
        Ok(())
    }
}
