//! HTTP middleware stack for the back office.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (shared with the storefront)
//! 4. Security headers (shared with the storefront)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Role extractors on each handler

pub mod auth;
pub mod session;

pub use auth::{
    RequireAdminAuth, RequireSuperAdmin, RequireWriter, clear_current_admin, set_current_admin,
};
pub use session::create_session_layer;

pub use roastline_storefront::middleware::{
    api_rate_limiter, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
