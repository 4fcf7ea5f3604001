//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roastline_core::{AddressId, UserId};

/// A saved shipping address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: UserId,
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    /// Destination ID understood by the shipping-rate API.
    pub city_id: String,
    pub province: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /account/addresses` and `PUT /account/addresses/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub city_id: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Trim every field and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns the name of the first empty required field.
    pub fn normalized(mut self) -> Result<Self, String> {
        let fields = [
            ("recipient_name", &mut self.recipient_name),
            ("phone", &mut self.phone),
            ("street", &mut self.street),
            ("city", &mut self.city),
            ("city_id", &mut self.city_id),
            ("province", &mut self.province),
            ("postal_code", &mut self.postal_code),
        ];
        for (name, value) in fields {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(format!("{name} is required"));
            }
            *value = trimmed.to_string();
        }

        self.label = self
            .label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            label: Some("  Kantor ".to_string()),
            recipient_name: " Sari ".to_string(),
            phone: "0812-000-111".to_string(),
            street: "Jl. Braga 12".to_string(),
            city: "Bandung".to_string(),
            city_id: "23".to_string(),
            province: "Jawa Barat".to_string(),
            postal_code: "40111".to_string(),
            is_default: false,
        }
    }

    #[test]
    fn test_normalized_trims() {
        let a = input().normalized().unwrap();
        assert_eq!(a.recipient_name, "Sari");
        assert_eq!(a.label.as_deref(), Some("Kantor"));
    }

    #[test]
    fn test_normalized_rejects_blank() {
        let mut a = input();
        a.city_id = "  ".to_string();
        assert_eq!(a.normalized().unwrap_err(), "city_id is required");
    }
}
