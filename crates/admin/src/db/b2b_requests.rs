//! Review of business-account requests.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use roastline_core::{AdminUserId, B2bRequestId, B2bRequestStatus, CustomerTier};
use roastline_storefront::db::b2b_requests::B2B_REQUEST_COLUMNS;

use super::{Page, RepositoryError};
use crate::models::B2bRequest;

pub struct B2bReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> B2bReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Requests, optionally of one status, oldest first so the queue reads
    /// in arrival order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<B2bRequestStatus>,
        page: Page,
    ) -> Result<(Vec<B2bRequest>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, B2bRequest>(&format!(
            r"
            SELECT {B2B_REQUEST_COLUMNS} FROM shop.b2b_request
            WHERE ($1::shop.b2b_request_status IS NULL OR status = $1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM shop.b2b_request
            WHERE ($1::shop.b2b_request_status IS NULL OR status = $1)
            ",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: B2bRequestId) -> Result<Option<B2bRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, B2bRequest>(&format!(
            "SELECT {B2B_REQUEST_COLUMNS} FROM shop.b2b_request WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Approve a pending request and make the customer a business customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown request and
    /// `RepositoryError::Conflict` if it was already reviewed.
    pub async fn approve(
        &self,
        id: B2bRequestId,
        reviewer: AdminUserId,
        note: Option<&str>,
    ) -> Result<B2bRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let request = lock_pending(&mut tx, id).await?;

        let reviewed =
            mark_reviewed(&mut tx, id, B2bRequestStatus::Approved, reviewer, note).await?;

        sqlx::query("UPDATE shop.customer SET tier = $2, updated_at = NOW() WHERE id = $1")
            .bind(request.customer_id)
            .bind(CustomerTier::B2b)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            request_id = %id,
            customer_id = %request.customer_id,
            reviewer = %reviewer,
            "B2B request approved"
        );
        Ok(reviewed)
    }

    /// Reject a pending request. The customer's tier is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown request and
    /// `RepositoryError::Conflict` if it was already reviewed.
    pub async fn reject(
        &self,
        id: B2bRequestId,
        reviewer: AdminUserId,
        note: Option<&str>,
    ) -> Result<B2bRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_pending(&mut tx, id).await?;

        let reviewed =
            mark_reviewed(&mut tx, id, B2bRequestStatus::Rejected, reviewer, note).await?;
        tx.commit().await?;

        info!(request_id = %id, reviewer = %reviewer, "B2B request rejected");
        Ok(reviewed)
    }
}

async fn lock_pending(
    tx: &mut Transaction<'_, Postgres>,
    id: B2bRequestId,
) -> Result<B2bRequest, RepositoryError> {
    let request = sqlx::query_as::<_, B2bRequest>(&format!(
        "SELECT {B2B_REQUEST_COLUMNS} FROM shop.b2b_request WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    if request.status != B2bRequestStatus::Pending {
        return Err(RepositoryError::Conflict(format!(
            "request is already {}",
            request.status
        )));
    }
    Ok(request)
}

async fn mark_reviewed(
    tx: &mut Transaction<'_, Postgres>,
    id: B2bRequestId,
    status: B2bRequestStatus,
    reviewer: AdminUserId,
    note: Option<&str>,
) -> Result<B2bRequest, RepositoryError> {
    let row = sqlx::query_as::<_, B2bRequest>(&format!(
        r"
        UPDATE shop.b2b_request
        SET status = $2, reviewed_by = $3, reviewed_at = NOW(), review_note = $4
        WHERE id = $1
        RETURNING {B2B_REQUEST_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status)
    .bind(reviewer)
    .bind(note)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}
