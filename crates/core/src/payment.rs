//! Payment gateway notifications.
//!
//! The gateway reports every change to a transaction by POSTing a JSON
//! notification. This module verifies the notification's signature and maps
//! the gateway's status vocabulary onto what it means for our order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::types::OrderStatus;

/// Notification signature did not verify.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("notification signature mismatch")]
    Mismatch,
}

/// A status string the gateway sent that we do not understand.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown gateway status: {0}")]
pub struct UnknownStatus(pub String);

/// Body of a gateway HTTP notification.
///
/// Only the fields we act on are modelled. The raw payload is stored
/// alongside the transaction for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Our order number.
    pub order_id: String,
    pub status_code: String,
    /// Amount with two decimals, exactly as signed (e.g. `"150000.00"`).
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
}

impl Notification {
    /// Verify `signature_key` against the merchant server key.
    ///
    /// The expected signature is the lower-case hex SHA-512 of
    /// `order_id ‖ status_code ‖ gross_amount ‖ server_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Mismatch`] if the signature is wrong.
    pub fn verify_signature(&self, server_key: &str) -> Result<(), SignatureError> {
        let expected = expected_signature(
            &self.order_id,
            &self.status_code,
            &self.gross_amount,
            server_key,
        );
        let provided = self.signature_key.trim().to_ascii_lowercase();

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Parse `transaction_status`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatus`] for vocabulary we do not recognise.
    pub fn gateway_status(&self) -> Result<GatewayStatus, UnknownStatus> {
        self.transaction_status.parse()
    }

    /// Parse `fraud_status`. Unrecognised values are treated as absent.
    #[must_use]
    pub fn fraud(&self) -> Option<FraudStatus> {
        self.fraud_status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Classify the notification.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatus`] if `transaction_status` is not recognised.
    pub fn outcome(&self) -> Result<PaymentOutcome, UnknownStatus> {
        Ok(PaymentOutcome::classify(self.gateway_status()?, self.fraud()))
    }
}

/// Hex SHA-512 signature the gateway computes for a notification.
#[must_use]
pub fn expected_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare two strings without short-circuiting on the first differing byte.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// The gateway's `transaction_status` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Cancel,
    Expire,
    Failure,
    Refund,
    PartialRefund,
    Authorize,
}

impl GatewayStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Settlement => "settlement",
            Self::Pending => "pending",
            Self::Deny => "deny",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
            Self::Failure => "failure",
            Self::Refund => "refund",
            Self::PartialRefund => "partial_refund",
            Self::Authorize => "authorize",
        }
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GatewayStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "cancel" => Ok(Self::Cancel),
            "expire" => Ok(Self::Expire),
            "failure" => Ok(Self::Failure),
            "refund" => Ok(Self::Refund),
            "partial_refund" => Ok(Self::PartialRefund),
            "authorize" => Ok(Self::Authorize),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// The gateway's fraud screening verdict on a card capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
}

impl std::str::FromStr for FraudStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "accept" => Ok(Self::Accept),
            "challenge" => Ok(Self::Challenge),
            "deny" => Ok(Self::Deny),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// What a notification means for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Money captured.
    Paid,
    /// Customer has not completed payment yet.
    Pending,
    /// Captured but held for manual fraud review at the gateway.
    AwaitingReview,
    Failed,
    Refunded,
}

impl PaymentOutcome {
    /// Map gateway status plus fraud verdict to an outcome.
    #[must_use]
    pub const fn classify(status: GatewayStatus, fraud: Option<FraudStatus>) -> Self {
        match status {
            GatewayStatus::Capture => match fraud {
                None | Some(FraudStatus::Accept) => Self::Paid,
                Some(FraudStatus::Challenge) => Self::AwaitingReview,
                Some(FraudStatus::Deny) => Self::Failed,
            },
            GatewayStatus::Settlement => Self::Paid,
            GatewayStatus::Pending | GatewayStatus::Authorize => Self::Pending,
            GatewayStatus::Deny
            | GatewayStatus::Cancel
            | GatewayStatus::Expire
            | GatewayStatus::Failure => Self::Failed,
            GatewayStatus::Refund | GatewayStatus::PartialRefund => Self::Refunded,
        }
    }

    /// The order status this outcome drives toward, if any.
    #[must_use]
    pub const fn target_status(self) -> Option<OrderStatus> {
        match self {
            Self::Paid => Some(OrderStatus::Paid),
            Self::Failed | Self::Refunded => Some(OrderStatus::Cancelled),
            Self::Pending | Self::AwaitingReview => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SERVER_KEY: &str = "SB-Mid-server-test-key";

    fn notification(status: &str, fraud: Option<&str>) -> Notification {
        let order_id = "RL-20240601-K3J9QZ";
        let status_code = "200";
        let gross_amount = "272000.00";
        Notification {
            order_id: order_id.to_owned(),
            status_code: status_code.to_owned(),
            gross_amount: gross_amount.to_owned(),
            signature_key: expected_signature(order_id, status_code, gross_amount, SERVER_KEY),
            transaction_status: status.to_owned(),
            fraud_status: fraud.map(str::to_owned),
            transaction_id: Some("b1f5c1a4-0000-4000-8000-000000000001".to_owned()),
            payment_type: Some("bank_transfer".to_owned()),
            transaction_time: None,
        }
    }

    #[test]
    fn test_signature_is_hex_sha512() {
        let sig = expected_signature("a", "b", "c", "d");
        assert_eq!(sig.len(), 128);
        assert_eq!(sig, hex::encode(Sha512::digest(b"abcd")));
    }

    #[test]
    fn test_verify_signature() {
        let n = notification("settlement", None);
        assert!(n.verify_signature(SERVER_KEY).is_ok());
        assert_eq!(
            n.verify_signature("other-key"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_case_insensitive() {
        let mut n = notification("settlement", None);
        n.signature_key = n.signature_key.to_uppercase();
        assert!(n.verify_signature(SERVER_KEY).is_ok());
    }

    #[test]
    fn test_tampered_amount_fails() {
        let mut n = notification("settlement", None);
        n.gross_amount = "1000.00".to_owned();
        assert_eq!(
            n.verify_signature(SERVER_KEY),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_capture_depends_on_fraud_status() {
        assert_eq!(
            notification("capture", Some("accept")).outcome().unwrap(),
            PaymentOutcome::Paid
        );
        assert_eq!(
            notification("capture", None).outcome().unwrap(),
            PaymentOutcome::Paid
        );
        assert_eq!(
            notification("capture", Some("challenge")).outcome().unwrap(),
            PaymentOutcome::AwaitingReview
        );
        assert_eq!(
            notification("capture", Some("deny")).outcome().unwrap(),
            PaymentOutcome::Failed
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            ("settlement", PaymentOutcome::Paid),
            ("pending", PaymentOutcome::Pending),
            ("authorize", PaymentOutcome::Pending),
            ("deny", PaymentOutcome::Failed),
            ("cancel", PaymentOutcome::Failed),
            ("expire", PaymentOutcome::Failed),
            ("failure", PaymentOutcome::Failed),
            ("refund", PaymentOutcome::Refunded),
            ("partial_refund", PaymentOutcome::Refunded),
        ];
        for (status, expected) in cases {
            assert_eq!(notification(status, None).outcome().unwrap(), expected, "{status}");
        }
    }

    #[test]
    fn test_unknown_status() {
        let err = notification("chargeback", None).outcome().unwrap_err();
        assert_eq!(err, UnknownStatus("chargeback".to_owned()));
    }

    #[test]
    fn test_target_status() {
        assert_eq!(PaymentOutcome::Paid.target_status(), Some(OrderStatus::Paid));
        assert_eq!(
            PaymentOutcome::Refunded.target_status(),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(PaymentOutcome::AwaitingReview.target_status(), None);
        assert_eq!(PaymentOutcome::Pending.target_status(), None);
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let json = r#"{
            "order_id": "RL-20240601-K3J9QZ",
            "status_code": "201",
            "gross_amount": "272000.00",
            "signature_key": "abc",
            "transaction_status": "pending"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.fraud_status, None);
        assert_eq!(n.gateway_status().unwrap(), GatewayStatus::Pending);
    }
}
