//! B2B upgrade requests, customer side.

use sqlx::PgPool;

use roastline_core::UserId;

use super::RepositoryError;
use crate::models::{B2bRequest, B2bRequestInput};

pub const B2B_REQUEST_COLUMNS: &str = "id, customer_id, company_name, tax_id, business_type, \
     phone, message, status, review_note, reviewed_by, reviewed_at, created_at";

pub struct B2bRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> B2bRequestRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a PENDING request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer already has one
    /// pending.
    pub async fn create(
        &self,
        customer_id: UserId,
        input: &B2bRequestInput,
    ) -> Result<B2bRequest, RepositoryError> {
        sqlx::query_as::<_, B2bRequest>(&format!(
            r"
            INSERT INTO shop.b2b_request
                (customer_id, company_name, tax_id, business_type, phone, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {B2B_REQUEST_COLUMNS}
            "
        ))
        .bind(customer_id)
        .bind(&input.company_name)
        .bind(input.tax_id.as_deref())
        .bind(&input.business_type)
        .bind(&input.phone)
        .bind(input.message.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "pending request"))
    }

    /// A customer's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<B2bRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, B2bRequest>(&format!(
            r"
            SELECT {B2B_REQUEST_COLUMNS} FROM shop.b2b_request
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Whether the customer has a request awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_pending(&self, customer_id: UserId) -> Result<bool, RepositoryError> {
        let pending = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM shop.b2b_request WHERE customer_id = $1 AND status = 'pending'
            )
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(pending)
    }
}
