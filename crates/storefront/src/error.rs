//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses carry a JSON body `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::{OrderTransitionError, RepositoryError};
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::shipping::ShippingError;
use crate::services::webhook::WebhookError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Order error: {0}")]
    Order(#[from] OrderTransitionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Server-side failures get a generic message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => auth_status(err),
            Self::Cart(err) => cart_status(err),
            Self::Checkout(err) => checkout_status(err),
            Self::Shipping(err) => shipping_status(err),
            Self::Webhook(err) => webhook_status(err),
            Self::Order(OrderTransitionError::Transition(err)) => {
                (StatusCode::CONFLICT, err.to_string())
            }
            Self::Order(OrderTransitionError::Repository(err)) => repository_status(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            Self::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_MESSAGE.to_string(),
    )
}

fn repository_status(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".to_string()),
        AuthError::MissingField(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::Repository(err) => repository_status(err),
        AuthError::PasswordHash => internal(),
    }
}

fn cart_status(err: &CartError) -> (StatusCode, String) {
    match err {
        CartError::InvalidQuantity | CartError::Pricing(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CartError::VariantNotFound | CartError::NotInCart => (StatusCode::NOT_FOUND, err.to_string()),
        CartError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CartError::Repository(err) => repository_status(err),
    }
}

fn checkout_status(err: &CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::EmptyCart | CheckoutError::MissingVoucherCode | CheckoutError::Pricing(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::Unavailable { .. } | CheckoutError::InsufficientStock { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::AddressNotFound => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Voucher(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        CheckoutError::Shipping(err) => shipping_status(err),
        CheckoutError::Payment { order_number, .. } => (
            StatusCode::BAD_GATEWAY,
            format!(
                "Payment gateway unavailable. Order {order_number} was saved; retry payment from your account."
            ),
        ),
        CheckoutError::Repository(err) => repository_status(err),
    }
}

fn shipping_status(err: &ShippingError) -> (StatusCode, String) {
    match err {
        ShippingError::UnknownCourier(_) | ShippingError::UnknownService { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ShippingError::Http(_)
        | ShippingError::Api { .. }
        | ShippingError::Parse(_)
        | ShippingError::AllCouriersFailed => (
            StatusCode::BAD_GATEWAY,
            "Shipping rates are unavailable right now".to_string(),
        ),
    }
}

fn webhook_status(err: &WebhookError) -> (StatusCode, String) {
    match err {
        WebhookError::Malformed(_) | WebhookError::UnknownStatus(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        WebhookError::Signature(_) => (StatusCode::FORBIDDEN, "Invalid signature".to_string()),
        WebhookError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        WebhookError::AmountMismatch { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        WebhookError::Repository(err) => repository_status(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roastline_core::{OrderStatus, SignatureError, TransitionError, VoucherError};

    use super::*;
    use crate::services::payment::PaymentError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("email already exists".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad row".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_statuses() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::InsufficientStock { available: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::Voucher(VoucherError::Expired).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                CheckoutError::Payment {
                    order_number: "RL-20240601-ABC123".to_string(),
                    source: PaymentError::Parse("eof".to_string()),
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(ShippingError::AllCouriersFailed.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(WebhookError::Signature(SignatureError::Mismatch).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(
                WebhookError::AmountMismatch {
                    expected: rust_decimal::Decimal::from(1),
                    received: "2.00".to_string(),
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                OrderTransitionError::Transition(TransitionError {
                    from: OrderStatus::Shipped,
                    to: OrderStatus::Cancelled,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let (_, message) = AppError::Internal("db password leaked".to_string()).status_and_message();
        assert_eq!(message, INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = AppError::Conflict("insufficient stock".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "insufficient stock");
    }
}
