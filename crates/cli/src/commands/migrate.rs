//! Database migration commands.
//!
//! Both migration sets live in one database (`shop`/`storefront` and
//! `admin` schemas) and share the `_sqlx_migrations` table, so each run
//! ignores versions that belong to the other set.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront migrations
//! - `ADMIN_DATABASE_URL` - admin migrations
//!
//! Both fall back to `DATABASE_URL`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;
use tracing::info;

use super::{MissingDatabaseUrl, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront migrations (`shop` and `storefront` schemas).
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn storefront() -> Result<(), MigrationError> {
    run(
        "storefront",
        "STOREFRONT_DATABASE_URL",
        sqlx::migrate!("../storefront/migrations"),
    )
    .await
}

/// Run admin migrations (`admin` schema).
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn admin() -> Result<(), MigrationError> {
    run(
        "admin",
        "ADMIN_DATABASE_URL",
        sqlx::migrate!("../admin/migrations"),
    )
    .await
}

async fn run(
    name: &str,
    env_var: &'static str,
    mut migrator: Migrator,
) -> Result<(), MigrationError> {
    let url = database_url(env_var)?;

    info!(target = name, "Connecting to database");
    let pool = PgPool::connect(url.expose_secret()).await?;

    migrator.set_ignore_missing(true);
    info!(
        target = name,
        migrations = migrator.iter().count(),
        "Running migrations"
    );
    migrator.run(&pool).await?;

    info!(target = name, "Migrations complete");
    pool.close().await;
    Ok(())
}
