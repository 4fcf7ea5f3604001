//! Shipping address repository.
//!
//! A customer has at most one default address (enforced by a partial unique
//! index). Every write that might change the default clears the old one in
//! the same transaction first.

use sqlx::{PgPool, Postgres, Transaction};

use roastline_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, customer_id, label, recipient_name, phone, street, city, \
     city_id, province, postal_code, is_default, created_at, updated_at";

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM shop.address
            WHERE customer_id = $1
            ORDER BY is_default DESC, created_at DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// An address, only if it belongs to `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        customer_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE id = $1 AND customer_id = $2"
        ))
        .bind(id)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Save a new address. The first address always becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        customer_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.address WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_one(&mut *tx)
                .await?;
        let is_default = input.is_default || existing == 0;
        if is_default {
            clear_default(&mut tx, customer_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO shop.address
                (customer_id, label, recipient_name, phone, street, city, city_id,
                 province, postal_code, is_default)
            VALUES ($1, COALESCE($2, 'Home'), $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(customer_id)
        .bind(input.label.as_deref())
        .bind(&input.recipient_name)
        .bind(&input.phone)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.city_id)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Replace an address's fields.
    ///
    /// Setting `is_default` moves the default here. Clearing it on the
    /// current default is ignored: some address must stay default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the customer's.
    pub async fn update(
        &self,
        customer_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_default(&mut tx, customer_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE shop.address
            SET label = COALESCE($3, label), recipient_name = $4, phone = $5, street = $6,
                city = $7, city_id = $8, province = $9, postal_code = $10,
                is_default = is_default OR $11, updated_at = NOW()
            WHERE id = $1 AND customer_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(customer_id)
        .bind(input.label.as_deref())
        .bind(&input.recipient_name)
        .bind(&input.phone)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.city_id)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete an address. If it was the default, the newest remaining
    /// address inherits the flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the customer's.
    pub async fn delete(&self, customer_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM shop.address WHERE id = $1 AND customer_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            sqlx::query(
                r"
                UPDATE shop.address SET is_default = TRUE, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM shop.address WHERE customer_id = $1
                    ORDER BY created_at DESC LIMIT 1
                )
                ",
            )
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the customer's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the customer's.
    pub async fn set_default(
        &self,
        customer_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        clear_default(&mut tx, customer_id).await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE shop.address SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1 AND customer_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }
}

async fn clear_default(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.address SET is_default = FALSE, updated_at = NOW() \
         WHERE customer_id = $1 AND is_default",
    )
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
