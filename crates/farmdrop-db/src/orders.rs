//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use farmdrop_core::{DeliveryTier, OrderStatus};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: i64,
    /// Street address as typed by the customer; `NULL` when they sent raw coordinates.
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    /// One of `free`, `fee_low`, `fee_high`, `unavailable`.
    pub delivery_tier: String,
    pub delivery_fee: Option<Decimal>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Parses the stored tier column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the column holds an unknown tier.
    pub fn tier(&self) -> Result<DeliveryTier, DbError> {
        self.delivery_tier
            .parse()
            .map_err(|reason| DbError::InvalidValue {
                column: "orders.delivery_tier",
                reason,
            })
    }
}

/// An order joined with its customer and totals, for the owner dashboard.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDashboardRow {
    pub id: i64,
    pub public_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub address: Option<String>,
    pub distance_km: f64,
    pub delivery_tier: String,
    pub delivery_fee: Option<Decimal>,
    pub status: String,
    pub notes: Option<String>,
    pub item_count: i64,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A line item joined with its food name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: i64,
    pub food_id: i64,
    pub food_name: String,
    pub food_slug: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub food_id: i64,
    pub quantity: i32,
    /// Price captured at order time so later catalog edits do not rewrite history.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: i64,
    pub address: Option<&'a str>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub delivery_tier: DeliveryTier,
    pub delivery_fee: Option<Decimal>,
    pub notes: Option<&'a str>,
    pub items: &'a [NewOrderItem],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardFilters<'a> {
    pub status: Option<OrderStatus>,
    pub customer_email: Option<&'a str>,
    pub limit: Option<i64>,
}

const ORDER_COLUMNS: &str = "id, public_id, user_id, address, latitude, longitude, distance_km, \
     delivery_tier, delivery_fee, status, notes, created_at, updated_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts an order and its line items in a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is persisted in
/// that case.
pub async fn create_order(pool: &PgPool, order: &NewOrder<'_>) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (public_id, user_id, address, latitude, longitude, distance_km, \
              delivery_tier, delivery_fee, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(order.user_id)
    .bind(order.address)
    .bind(order.latitude)
    .bind(order.longitude)
    .bind(order.distance_km)
    .bind(order.delivery_tier.as_str())
    .bind(order.delivery_fee)
    .bind(OrderStatus::Received.as_str())
    .bind(order.notes)
    .fetch_one(&mut *tx)
    .await?;

    for item in order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, food_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(row.id)
        .bind(item.food_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Sets the status of the order identified by `public_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order matches, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_order_status(
    pool: &PgPool,
    public_id: Uuid,
    status: OrderStatus,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $2, updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(public_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns a customer's orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all orders with customer details and item totals, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_dashboard(
    pool: &PgPool,
    filters: DashboardFilters<'_>,
) -> Result<Vec<OrderDashboardRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderDashboardRow>(
        "SELECT o.id, o.public_id, u.name AS customer_name, u.email AS customer_email, \
                o.address, o.distance_km, o.delivery_tier, o.delivery_fee, o.status, o.notes, \
                COUNT(oi.id) AS item_count, \
                COALESCE(SUM(oi.quantity * oi.unit_price), 0)::NUMERIC(12,2) AS subtotal, \
                o.created_at \
         FROM orders o \
         JOIN users u ON u.id = o.user_id \
         LEFT JOIN order_items oi ON oi.order_id = o.id \
         WHERE ($1::TEXT IS NULL OR o.status = $1) \
           AND ($2::TEXT IS NULL OR u.email = LOWER($2)) \
         GROUP BY o.id, u.name, u.email \
         ORDER BY o.created_at DESC, o.id DESC \
         LIMIT $3",
    )
    .bind(filters.status.map(OrderStatus::as_str))
    .bind(filters.customer_email)
    .bind(filters.limit.unwrap_or(100))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the line items for the given orders, grouped by order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_items(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.order_id, oi.food_id, f.name AS food_name, f.slug AS food_slug, \
                oi.quantity, oi.unit_price \
         FROM order_items oi \
         JOIN foods f ON f.id = oi.food_id \
         WHERE oi.order_id = ANY($1) \
         ORDER BY oi.order_id, f.name",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
