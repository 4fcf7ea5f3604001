//! Admin authentication service.
//!
//! Staff log in with email and password. Hashing is the storefront's
//! Argon2id helper, with a longer minimum password for staff accounts.

mod error;

pub use error::AdminAuthError;

use sqlx::PgPool;

use roastline_core::{AdminUserId, Email};
use roastline_storefront::services::auth::{AuthError, hash_password, verify_password};

use crate::db::RepositoryError;
use crate::db::admin_users::AdminUserRepository;
use crate::models::{AdminRole, AdminUser};

/// Minimum password length for staff accounts.
pub const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;

/// A new staff account.
#[derive(Debug)]
pub struct NewAdmin<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub role: AdminRole,
    pub password: &'a str,
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
        }
    }

    /// Verify credentials and record the login time.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email or a
    /// wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
        self.users.touch_last_login(user.id).await?;

        Ok(user)
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail`, `AdminAuthError::WeakPassword`
    /// or `AdminAuthError::MissingField` for bad input and
    /// `AdminAuthError::UserAlreadyExists` for a taken email.
    pub async fn create_admin(&self, new: &NewAdmin<'_>) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(new.email)?;
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AdminAuthError::MissingField("name"));
        }
        validate_admin_password(new.password)?;

        let password_hash = hash_password(new.password).map_err(|e| match e {
            AuthError::WeakPassword(msg) => AdminAuthError::WeakPassword(msg),
            _ => AdminAuthError::PasswordHash,
        })?;

        self.users
            .create(&email, name, new.role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `AdminAuthError::UserNotFound` if the account was deleted.
    pub async fn get_admin(&self, id: AdminUserId) -> Result<AdminUser, AdminAuthError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(AdminAuthError::UserNotFound)
    }
}

/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` when the password is too short.
pub fn validate_admin_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_admin_password() {
        assert!(validate_admin_password("short-pass").is_err());
        assert!(validate_admin_password("a-much-longer-passphrase").is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AdminAuthError::MissingField("name").to_string(),
            "name is required"
        );
        assert_eq!(
            AdminAuthError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
    }
}
