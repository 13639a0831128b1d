//! Owner dashboard: every order, filterable, with status updates.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use farmdrop_core::OrderStatus;
use farmdrop_db::{DashboardFilters, DbError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::orders::{group_items, OrderLineItem};
use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DashboardQuery {
    pub status: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardOrder {
    order_id: Uuid,
    customer_name: String,
    customer_email: String,
    address: Option<String>,
    distance_km: f64,
    delivery_tier: String,
    delivery_fee: Option<Decimal>,
    status: String,
    notes: Option<String>,
    item_count: i64,
    subtotal: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusUpdated {
    order_id: Uuid,
    status: String,
    updated_at: DateTime<Utc>,
}

fn parse_status(rid: &str, raw: &str) -> Result<OrderStatus, ApiError> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|reason: String| ApiError::new(rid, "validation_error", reason))
}

/// GET /api/v1/owner/orders — all orders, newest first.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<Vec<DashboardOrder>>>, ApiError> {
    let rid = &req_id.0;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_status(rid, s))
        .transpose()?;

    let rows = farmdrop_db::list_orders_dashboard(
        &state.pool,
        DashboardFilters {
            status,
            customer_email: query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
            limit: Some(normalize_limit(query.limit)),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let order_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut items_by_order = group_items(
        farmdrop_db::get_order_items(&state.pool, &order_ids)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?,
    );

    let data = rows
        .into_iter()
        .map(|row| DashboardOrder {
            items: items_by_order.remove(&row.id).unwrap_or_default(),
            order_id: row.public_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            address: row.address,
            distance_km: row.distance_km,
            delivery_tier: row.delivery_tier,
            total: row.subtotal + row.delivery_fee.unwrap_or_default(),
            delivery_fee: row.delivery_fee,
            status: row.status,
            notes: row.notes,
            item_count: row.item_count,
            subtotal: row.subtotal,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/owner/orders/{public_id}/status
pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<CurrentUser>,
    Path(public_id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<StatusUpdated>>, ApiError> {
    let rid = &req_id.0;
    let status = parse_status(rid, &body.status)?;

    let row = farmdrop_db::update_order_status(&state.pool, public_id, status)
        .await
        .map_err(|e| match e {
            DbError::NotFound => ApiError::new(rid, "not_found", "order not found"),
            other => map_db_error(rid.clone(), &other),
        })?;

    tracing::info!(owner_id = owner.id, order_id = %public_id, %status, "order status updated");

    Ok(Json(ApiResponse {
        data: StatusUpdated {
            order_id: row.public_id,
            status: row.status,
            updated_at: row.updated_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
