//! Order and currency handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use chrono::NaiveDate;
use serde::Deserialize;

use ocsync_core::{
    CurrencyRate, OrderDetails, OrderId, OrderProduct, OrderStatusId, OrderStatusQuery,
    OrderStatusUpdate,
};

use super::{ApiResult, ok};
use crate::middleware::RequireApiKey;
use crate::state::AppState;

/// Query string of the order search.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub from: Option<NaiveDate>,
}

/// Order header with line items and totals.
pub async fn order(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    order_id: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<OrderDetails> {
    let Path(order_id) = order_id?;
    ok(state.orders().order(order_id).await?)
}

pub async fn products(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    order_id: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<Vec<OrderProduct>> {
    let Path(order_id) = order_id?;
    ok(state.orders().products(order_id).await?)
}

/// Ids of orders in a status, optionally modified since `from`.
pub async fn ids_by_status(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    status_id: Result<Path<OrderStatusId>, PathRejection>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<Vec<OrderId>> {
    let Path(order_status_id) = status_id?;
    let Query(query) = query?;
    ok(state
        .orders()
        .ids_by_status(OrderStatusQuery {
            order_status_id,
            from: query.from,
        })
        .await?)
}

pub async fn set_status(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<OrderStatusUpdate>, JsonRejection>,
) -> ApiResult<()> {
    let Json(update) = body?;
    state.orders().set_status(&update).await?;
    ok(())
}

pub async fn set_currency_rate(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    body: Result<Json<CurrencyRate>, JsonRejection>,
) -> ApiResult<()> {
    let Json(rate) = body?;
    state.currency().set_rate(&rate).await?;
    ok(())
}
