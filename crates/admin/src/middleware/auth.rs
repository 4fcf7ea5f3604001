//! Authentication and role extractors for the back office.
//!
//! The logged-in admin lives in the session as a [`CurrentAdmin`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::{AdminRole, CurrentAdmin, session_keys};

/// Extractor that requires any logged-in admin, viewers included.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdminAuth(admin): RequireAdminAuth) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Extractor that requires a role allowed to change data (not a viewer).
pub struct RequireWriter(pub CurrentAdmin);

/// Extractor that requires a super admin.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Rejection for the admin extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// No admin in the session.
    Unauthorized,
    /// Logged in, but the role is too low.
    Forbidden(&'static str),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or(AdminAuthRejection::Unauthorized)
}

/// Check a role against the write requirement.
///
/// # Errors
///
/// Returns `AdminAuthRejection::Forbidden` for viewers.
pub const fn require_writer(role: AdminRole) -> Result<(), AdminAuthRejection> {
    if role.can_write() {
        Ok(())
    } else {
        Err(AdminAuthRejection::Forbidden("Read-only accounts cannot make changes"))
    }
}

/// Check a role against the super-admin requirement.
///
/// # Errors
///
/// Returns `AdminAuthRejection::Forbidden` for anything below super admin.
pub const fn require_super_admin(role: AdminRole) -> Result<(), AdminAuthRejection> {
    match role {
        AdminRole::SuperAdmin => Ok(()),
        AdminRole::Admin | AdminRole::Viewer => Err(AdminAuthRejection::Forbidden(
            "Only super admins can access this resource",
        )),
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_admin(parts).await?))
    }
}

impl<S> FromRequestParts<S> for RequireWriter
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        require_writer(admin.role)?;
        Ok(Self(admin))
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        require_super_admin(admin.role)?;
        Ok(Self(admin))
    }
}

/// Store the admin in the session, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        assert!(require_writer(AdminRole::SuperAdmin).is_ok());
        assert!(require_writer(AdminRole::Admin).is_ok());
        assert!(require_writer(AdminRole::Viewer).is_err());

        assert!(require_super_admin(AdminRole::SuperAdmin).is_ok());
        assert!(require_super_admin(AdminRole::Admin).is_err());
        assert!(require_super_admin(AdminRole::Viewer).is_err());
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            require_writer(AdminRole::Viewer)
                .unwrap_err()
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
    }
}
