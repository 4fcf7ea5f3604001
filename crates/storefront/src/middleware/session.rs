//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions in `storefront.session`. The cookie
//! carrying the session id is signed with a key derived from the configured
//! session secret.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "rl_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the cookie signing key from a session secret.
///
/// The secret is validated to at least 32 characters at start-up. SHA-512
/// stretches it to the 64 bytes the key requires.
#[must_use]
pub fn session_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer with `PostgreSQL` store.
///
/// The table is created by the storefront migrations.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, String> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("storefront")?
        .with_table_name("session")?;

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(session_key(&config.session_secret)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_follows_secret() {
        let a = SecretString::from("k8Jf2mQx9Lp4Rz7Wc1Vb6Nh3Td5Ys0Ga");
        let b = SecretString::from("k8Jf2mQx9Lp4Rz7Wc1Vb6Nh3Td5Ys0Gb");

        assert_eq!(session_key(&a).master(), session_key(&a).master());
        assert_ne!(session_key(&a).master(), session_key(&b).master());
    }
}
