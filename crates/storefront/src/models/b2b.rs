//! Requests to become a business (B2B) customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roastline_core::{B2bRequestId, B2bRequestStatus, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct B2bRequest {
    pub id: B2bRequestId,
    pub customer_id: UserId,
    pub company_name: String,
    pub tax_id: Option<String>,
    /// e.g. "cafe", "office", "reseller".
    pub business_type: String,
    pub phone: String,
    pub message: Option<String>,
    pub status: B2bRequestStatus,
    pub review_note: Option<String>,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /b2b/requests`.
#[derive(Debug, Clone, Deserialize)]
pub struct B2bRequestInput {
    pub company_name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    pub business_type: String,
    pub phone: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl B2bRequestInput {
    /// Trim fields, drop blank optionals, and require the mandatory ones.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first missing field.
    pub fn normalized(self) -> Result<Self, String> {
        let required = |name: &str, v: String| {
            let v = v.trim().to_string();
            if v.is_empty() {
                Err(format!("{name} is required"))
            } else {
                Ok(v)
            }
        };
        let optional = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Self {
            company_name: required("company_name", self.company_name)?,
            tax_id: optional(self.tax_id),
            business_type: required("business_type", self.business_type)?,
            phone: required("phone", self.phone)?,
            message: optional(self.message),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized() {
        let input = B2bRequestInput {
            company_name: " Kopi Senja ".to_string(),
            tax_id: Some("   ".to_string()),
            business_type: "cafe".to_string(),
            phone: "0812".to_string(),
            message: None,
        }
        .normalized()
        .unwrap();

        assert_eq!(input.company_name, "Kopi Senja");
        assert_eq!(input.tax_id, None);
    }

    #[test]
    fn test_missing_company() {
        let err = B2bRequestInput {
            company_name: String::new(),
            tax_id: None,
            business_type: "cafe".to_string(),
            phone: "0812".to_string(),
            message: None,
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err, "company_name is required");
    }
}
