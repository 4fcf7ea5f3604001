//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Missing environment variable: {0} (or DATABASE_URL)")]
pub struct MissingDatabaseUrl(pub &'static str);

/// Read `primary`, falling back to `DATABASE_URL`. Loads `.env` first.
pub fn database_url(primary: &'static str) -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl(primary))
}
