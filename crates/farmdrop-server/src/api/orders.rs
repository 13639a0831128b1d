//! Customer order handlers: place an order, list your own orders.

use std::collections::{HashMap, HashSet};

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use farmdrop_db::{FoodRow, NewOrder, NewOrderItem, OrderItemRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::delivery::{quote_destination, resolve_destination};
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_LINES: usize = 50;
const MAX_QUANTITY: i32 = 99;
const MAX_NOTES_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub(super) struct OrderLineRequest {
    pub food_slug: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderLineItem {
    food_slug: String,
    food_name: String,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderLineItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            line_total: row.unit_price * Decimal::from(row.quantity),
            food_slug: row.food_slug,
            food_name: row.food_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OrderSummary {
    order_id: Uuid,
    status: String,
    address: Option<String>,
    distance_km: f64,
    delivery_tier: String,
    delivery_fee: Option<Decimal>,
    subtotal: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct PlacedOrder {
    #[serde(flatten)]
    order: OrderSummary,
    message: &'static str,
}

/// Groups line items by order id, preserving query order within each order.
pub(super) fn group_items(rows: Vec<OrderItemRow>) -> HashMap<i64, Vec<OrderLineItem>> {
    let mut grouped: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    grouped
}

pub(super) fn subtotal_of(items: &[OrderLineItem]) -> Decimal {
    items.iter().map(|item| item.line_total).sum()
}

fn validate_lines(rid: &str, lines: &[OrderLineRequest]) -> Result<(), ApiError> {
    if lines.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "an order needs at least one item",
        ));
    }
    if lines.len() > MAX_LINES {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("an order can have at most {MAX_LINES} items"),
        ));
    }
    let mut seen = HashSet::new();
    for line in lines {
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!(
                    "quantity for '{}' must be between 1 and {MAX_QUANTITY}",
                    line.food_slug
                ),
            ));
        }
        if !seen.insert(line.food_slug.as_str()) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("'{}' is listed more than once", line.food_slug),
            ));
        }
    }
    Ok(())
}

/// Pairs each requested line with its catalog row, snapshotting the current
/// price. Returns the insert rows and the order subtotal.
fn price_lines(
    rid: &str,
    lines: &[OrderLineRequest],
    foods: &[FoodRow],
) -> Result<(Vec<NewOrderItem>, Decimal), ApiError> {
    let by_slug: HashMap<&str, &FoodRow> = foods.iter().map(|f| (f.slug.as_str(), f)).collect();
    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let food = by_slug.get(line.food_slug.as_str()).ok_or_else(|| {
            ApiError::new(
                rid,
                "validation_error",
                format!("unknown food '{}'", line.food_slug),
            )
        })?;
        if !food.is_available {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("'{}' is sold out", food.name),
            ));
        }
        subtotal += food.price * Decimal::from(line.quantity);
        items.push(NewOrderItem {
            food_id: food.id,
            quantity: line.quantity,
            unit_price: food.price,
        });
    }

    Ok((items, subtotal))
}

/// POST /api/v1/orders — quote, validate, and record an order.
pub(super) async fn place_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlacedOrder>>), ApiError> {
    let rid = &req_id.0;
    validate_lines(rid, &body.items)?;
    let notes = body.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_CHARS) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("notes must be at most {MAX_NOTES_CHARS} characters"),
        ));
    }
    let address = body.address.as_deref().map(str::trim).filter(|a| !a.is_empty());

    let destination =
        resolve_destination(&state, rid, body.latitude, body.longitude, address).await?;
    let quote = quote_destination(&state, rid, &destination)?;
    if !quote.is_deliverable() {
        tracing::info!(
            user_id = user.id,
            distance_km = quote.distance_km,
            "order rejected: outside delivery area"
        );
        return Err(ApiError::new(rid, "delivery_unavailable", quote.message()));
    }

    let slugs: Vec<String> = body.items.iter().map(|l| l.food_slug.clone()).collect();
    let foods = farmdrop_db::get_foods_by_slugs(&state.pool, &slugs)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let (items, subtotal) = price_lines(rid, &body.items, &foods)?;
    let fee = quote.fee().unwrap_or_default();

    // Coordinates sent directly take precedence, so only keep the typed
    // address when it was actually geocoded.
    let stored_address = destination.place_name.as_ref().and(address);
    let row = farmdrop_db::create_order(
        &state.pool,
        &NewOrder {
            user_id: user.id,
            address: stored_address,
            latitude: destination.coordinate.latitude(),
            longitude: destination.coordinate.longitude(),
            distance_km: quote.distance_km,
            delivery_tier: quote.tier,
            delivery_fee: quote.fee(),
            notes,
            items: &items,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    state
        .sessions
        .push_flash(&user.session_token, quote.message())
        .await;
    tracing::info!(
        user_id = user.id,
        order_id = %row.public_id,
        tier = %quote.tier,
        "order placed"
    );

    let line_items = farmdrop_db::get_order_items(&state.pool, &[row.id])
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(OrderLineItem::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PlacedOrder {
                order: OrderSummary {
                    order_id: row.public_id,
                    status: row.status,
                    address: row.address,
                    distance_km: row.distance_km,
                    delivery_tier: row.delivery_tier,
                    delivery_fee: row.delivery_fee,
                    subtotal,
                    total: subtotal + fee,
                    notes: row.notes,
                    created_at: row.created_at,
                    items: line_items,
                },
                message: quote.message(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/orders — the caller's orders, newest first.
pub(super) async fn list_my_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>, ApiError> {
    let rows = farmdrop_db::list_orders_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let order_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut items_by_order = group_items(
        farmdrop_db::get_order_items(&state.pool, &order_ids)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
    );

    let data = rows
        .into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            let subtotal = subtotal_of(&items);
            OrderSummary {
                order_id: row.public_id,
                status: row.status,
                address: row.address,
                distance_km: row.distance_km,
                delivery_tier: row.delivery_tier,
                total: subtotal + row.delivery_fee.unwrap_or_default(),
                delivery_fee: row.delivery_fee,
                subtotal,
                notes: row.notes,
                created_at: row.created_at,
                items,
            }
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
