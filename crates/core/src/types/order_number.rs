//! Human-facing order numbers.
//!
//! The order number doubles as the `order_id` sent to the payment gateway, so
//! it must be unique, short, and free of characters the gateway rejects.

use chrono::NaiveDate;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "RL";
const SUFFIX_LEN: usize = 6;

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must look like RL-YYYYMMDD-XXXXXX")]
    Malformed,
    #[error("order number date is invalid")]
    InvalidDate,
}

/// An order number of the form `RL-YYYYMMDD-XXXXXX`.
///
/// ```
/// use roastline_core::OrderNumber;
///
/// let n = OrderNumber::parse("RL-20240612-A1B2C3").unwrap();
/// assert_eq!(n.as_str(), "RL-20240612-A1B2C3");
/// assert!(OrderNumber::parse("RL-2024-A1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh number for an order placed on `date`.
    ///
    /// The six-character suffix is random upper-case alphanumerics. Collisions
    /// are caught by the unique index on `shop.order.order_number`.
    #[must_use]
    pub fn generate(date: NaiveDate) -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(format!("{PREFIX}-{}-{suffix}", date.format("%Y%m%d")))
    }

    /// Validate the shape of an order number.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError`] if the prefix, date or suffix is wrong.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim();
        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OrderNumberError::Malformed);
        };

        if prefix != PREFIX
            || date.len() != 8
            || suffix.len() != SUFFIX_LEN
            || !suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(OrderNumberError::Malformed);
        }

        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| OrderNumberError::InvalidDate)?;

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(n: OrderNumber) -> Self {
        n.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_parseable() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let n = OrderNumber::generate(date);
        assert!(n.as_str().starts_with("RL-20240229-"));
        assert_eq!(OrderNumber::parse(n.as_str()).unwrap(), n);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!(
            OrderNumber::parse("XX-20240101-ABCDEF"),
            Err(OrderNumberError::Malformed)
        );
        assert_eq!(
            OrderNumber::parse("RL-20240101-abcdef"),
            Err(OrderNumberError::Malformed)
        );
        assert_eq!(
            OrderNumber::parse("RL-20240101-ABCDEF-1"),
            Err(OrderNumberError::Malformed)
        );
        assert_eq!(
            OrderNumber::parse("RL-20241301-ABCDEF"),
            Err(OrderNumberError::InvalidDate)
        );
    }
}
