//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! ADMIN_PASSWORD='...' rl-cli admin create -e ops@roastline.coffee -n "Ops" -r super_admin
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_PASSWORD` - password when `--password` is not given

use roastline_admin::db;
use roastline_admin::services::auth::{AdminAuthError, AdminAuthService, NewAdmin};
use roastline_core::{AdminRole, AdminUserId};
use thiserror::Error;
use tracing::info;

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("No password given: pass --password or set ADMIN_PASSWORD")]
    MissingPassword,

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Create a staff account. The password is hashed with Argon2id by the
/// admin auth service.
///
/// # Errors
///
/// Returns `AdminError` for a bad role, a missing or weak password, an
/// invalid or taken email, or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<AdminUserId, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let url = database_url("ADMIN_DATABASE_URL")?;
    let password = resolve_password(password, std::env::var("ADMIN_PASSWORD").ok())?;

    info!("Connecting to admin database...");
    let pool = db::create_pool(&url).await?;

    let admin = AdminAuthService::new(&pool)
        .create_admin(&NewAdmin {
            email,
            name,
            role,
            password: &password,
        })
        .await?;

    info!(
        admin_id = %admin.id,
        email = %admin.email,
        role = %admin.role,
        "Admin user created"
    );
    Ok(admin.id)
}

/// `--password` wins over `ADMIN_PASSWORD`. Blank values count as absent.
fn resolve_password(flag: Option<String>, env: Option<String>) -> Result<String, AdminError> {
    flag.into_iter()
        .chain(env)
        .find(|p| !p.is_empty())
        .ok_or(AdminError::MissingPassword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_env() {
        let password =
            resolve_password(Some("from-the-flag-1".into()), Some("from-env-var-1".into()));
        assert_eq!(password.unwrap(), "from-the-flag-1");
    }

    #[test]
    fn test_env_used_when_flag_absent_or_blank() {
        assert_eq!(
            resolve_password(None, Some("from-env-var-1".into())).unwrap(),
            "from-env-var-1"
        );
        assert_eq!(
            resolve_password(Some(String::new()), Some("from-env-var-1".into())).unwrap(),
            "from-env-var-1"
        );
    }

    #[test]
    fn test_missing_password() {
        assert!(matches!(
            resolve_password(None, None),
            Err(AdminError::MissingPassword)
        ));
    }
}
