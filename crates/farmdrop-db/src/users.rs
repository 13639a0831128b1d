//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `users` table.
///
/// `password_hash` is a PHC-format argon2 string; it never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, is_owner, created_at, updated_at";

/// Inserts a new customer account. Emails are stored lowercased.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate email surfaces
/// as a unique violation (see [`DbError::is_unique_violation`]).
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, name, password_hash) \
         VALUES (LOWER($1), $2, $3) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email.trim())
    .bind(name.trim())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Case-insensitive lookup by email.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes a user and, through `ON DELETE CASCADE`, their orders.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has `id`, or [`DbError::Sqlx`]
/// if the delete fails.
pub async fn delete_user(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Grants or revokes owner access for the account with `email`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no account matches, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn set_user_owner(pool: &PgPool, email: &str, is_owner: bool) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET is_owner = $2, updated_at = NOW() \
         WHERE email = LOWER($1) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email.trim())
    .bind(is_owner)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
