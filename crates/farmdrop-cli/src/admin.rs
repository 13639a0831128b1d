//! Database and account maintenance handlers for the CLI.

/// Verify the database answers a trivial query.
pub(crate) async fn run_db_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    farmdrop_db::ping(pool).await?;
    println!("database ok");
    Ok(())
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub(crate) async fn run_db_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = farmdrop_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("{applied} migration(s) applied");
    Ok(())
}

/// Load the foods YAML file named by the config and upsert every entry.
///
/// Entries are keyed by slug, so re-running the seed updates prices and
/// availability in place rather than duplicating rows.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the upsert fails.
pub(crate) async fn run_db_seed(
    pool: &sqlx::PgPool,
    config: &farmdrop_core::AppConfig,
) -> anyhow::Result<()> {
    let file = farmdrop_core::load_foods(&config.foods_path)?;
    let count = farmdrop_db::seed_foods(pool, &file.foods).await?;
    tracing::info!(count, path = %config.foods_path.display(), "food catalog seeded");
    println!("{count} food(s) seeded");
    Ok(())
}

/// Set or clear the owner flag on an existing account.
pub(crate) async fn run_promote(
    pool: &sqlx::PgPool,
    email: &str,
    is_owner: bool,
) -> anyhow::Result<()> {
    let user = match farmdrop_db::set_user_owner(pool, email, is_owner).await {
        Ok(user) => user,
        Err(farmdrop_db::DbError::NotFound) => {
            anyhow::bail!("no account with email '{}'", email.trim())
        }
        Err(e) => return Err(e.into()),
    };
    let verb = if user.is_owner { "granted" } else { "revoked" };
    tracing::info!(user_id = user.id, is_owner = user.is_owner, "owner flag updated");
    println!("owner access {verb} for {}", user.email);
    Ok(())
}
