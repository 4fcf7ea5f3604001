//! Payment gateway webhook.
//!
//! The gateway retries anything that is not a 2xx, so a notification that
//! changes nothing (duplicate, late, or refused by the order state machine)
//! still answers 200.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::webhook::{WebhookEffect, process_notification};
use crate::state::AppState;

/// Acknowledgement returned to the gateway.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
    pub effect: WebhookEffect,
}

/// Receive a payment notification.
#[instrument(skip_all)]
pub async fn payment(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> Result<Json<WebhookAck>> {
    let effect = process_notification(state.pool(), &state.config().payment, &raw).await?;
    Ok(Json(WebhookAck {
        status: "ok",
        effect,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roastline_core::OrderStatus;

    use super::*;

    #[test]
    fn test_ack_shape() {
        let ack = WebhookAck {
            status: "ok",
            effect: WebhookEffect::Recorded {
                status: OrderStatus::Paid,
            },
        };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["effect"]["result"], "recorded");
        assert_eq!(json["effect"]["status"], "paid");
    }
}
