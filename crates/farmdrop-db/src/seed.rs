use farmdrop_core::FoodConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert catalog entries from config, keyed by slug.
///
/// Returns the number of foods processed (inserted or updated). All upserts
/// run inside a single transaction; if any fails the batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_foods(pool: &PgPool, foods: &[FoodConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for food in foods {
        sqlx::query(
            "INSERT INTO foods (name, slug, description, price, unit, image_url, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 price = EXCLUDED.price, \
                 unit = EXCLUDED.unit, \
                 image_url = EXCLUDED.image_url, \
                 is_available = EXCLUDED.is_available, \
                 updated_at = NOW()",
        )
        .bind(&food.name)
        .bind(food.slug())
        .bind(&food.description)
        .bind(food.price)
        .bind(&food.unit)
        .bind(&food.image_url)
        .bind(food.available)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
