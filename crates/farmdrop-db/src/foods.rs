//! Database operations for the `foods` catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `foods` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoodRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a catalog entry.
#[derive(Debug, Clone)]
pub struct NewFood<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub unit: &'a str,
    pub image_url: Option<&'a str>,
}

const FOOD_COLUMNS: &str =
    "id, name, slug, description, price, unit, image_url, is_available, created_at, updated_at";

/// Lists catalog entries ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_foods(pool: &PgPool, available_only: bool) -> Result<Vec<FoodRow>, DbError> {
    let rows = sqlx::query_as::<_, FoodRow>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods \
         WHERE ($1 = false OR is_available = true) \
         ORDER BY name"
    ))
    .bind(available_only)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_food_by_slug(pool: &PgPool, slug: &str) -> Result<Option<FoodRow>, DbError> {
    let row = sqlx::query_as::<_, FoodRow>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches every food whose slug is in `slugs`. Missing slugs are simply
/// absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_foods_by_slugs(pool: &PgPool, slugs: &[String]) -> Result<Vec<FoodRow>, DbError> {
    let rows = sqlx::query_as::<_, FoodRow>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE slug = ANY($1)"
    ))
    .bind(slugs)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a catalog entry and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate slug is a
/// unique violation.
pub async fn create_food(pool: &PgPool, food: &NewFood<'_>) -> Result<FoodRow, DbError> {
    let row = sqlx::query_as::<_, FoodRow>(&format!(
        "INSERT INTO foods (name, slug, description, price, unit, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {FOOD_COLUMNS}"
    ))
    .bind(food.name)
    .bind(food.slug)
    .bind(food.description)
    .bind(food.price)
    .bind(food.unit)
    .bind(food.image_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a food as available or sold out.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown slug, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_food_availability(
    pool: &PgPool,
    slug: &str,
    is_available: bool,
) -> Result<FoodRow, DbError> {
    let row = sqlx::query_as::<_, FoodRow>(&format!(
        "UPDATE foods SET is_available = $2, updated_at = NOW() \
         WHERE slug = $1 \
         RETURNING {FOOD_COLUMNS}"
    ))
    .bind(slug)
    .bind(is_available)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
