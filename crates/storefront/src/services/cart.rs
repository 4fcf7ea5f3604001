//! Cart operations with stock checks.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use roastline_core::{PricingError, UserId, VariantId};

use crate::db::{CartRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::CartView;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("product variant not found")]
    VariantNotFound,

    #[error("insufficient stock: only {available} available")]
    InsufficientStock { available: i32 },

    #[error("item is not in the cart")]
    NotInCart,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CartService<'a> {
    pool: &'a PgPool,
    b2b_discount_percent: Decimal,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, b2b_discount_percent: Decimal) -> Self {
        Self {
            pool,
            b2b_discount_percent,
        }
    }

    /// The priced cart. The tier is read fresh from the database.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn view(&self, customer_id: UserId) -> Result<CartView, CartError> {
        let tier = UserRepository::new(self.pool).get_tier(customer_id).await?;
        let lines = CartRepository::new(self.pool).lines(customer_id).await?;
        Ok(CartView::price(&lines, tier, self.b2b_discount_percent)?)
    }

    /// Add `quantity` of a variant on top of what is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::VariantNotFound` for an inactive or unknown variant
    /// and `CartError::InsufficientStock` when the new total exceeds stock.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        let cart = CartRepository::new(self.pool);
        let existing = cart.quantity_of(customer_id, variant_id).await?;
        let wanted = existing.saturating_add(quantity);

        self.check_stock(variant_id, wanted).await?;
        cart.set_quantity(customer_id, variant_id, wanted).await?;
        self.view(customer_id).await
    }

    /// Set the quantity of a cart line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a negative quantity and the
    /// same stock errors as [`Self::add_item`].
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity);
        }
        let cart = CartRepository::new(self.pool);
        if quantity == 0 {
            cart.remove(customer_id, variant_id).await?;
        } else {
            self.check_stock(variant_id, quantity).await?;
            cart.set_quantity(customer_id, variant_id, quantity).await?;
        }
        self.view(customer_id).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the variant was not in the cart.
    pub async fn remove(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
    ) -> Result<CartView, CartError> {
        if !CartRepository::new(self.pool)
            .remove(customer_id, variant_id)
            .await?
        {
            return Err(CartError::NotInCart);
        }
        self.view(customer_id).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn clear(&self, customer_id: UserId) -> Result<CartView, CartError> {
        CartRepository::new(self.pool).clear(customer_id).await?;
        self.view(customer_id).await
    }

    async fn check_stock(&self, variant_id: VariantId, wanted: i32) -> Result<(), CartError> {
        let variant = ProductRepository::new(self.pool)
            .get_purchasable_variant(variant_id)
            .await?
            .ok_or(CartError::VariantNotFound)?;

        check_available(variant.stock, wanted)
    }
}

fn check_available(stock: i32, wanted: i32) -> Result<(), CartError> {
    if wanted > stock {
        return Err(CartError::InsufficientStock {
            available: stock.max(0),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_available() {
        assert!(check_available(5, 5).is_ok());
        assert!(matches!(
            check_available(5, 6),
            Err(CartError::InsufficientStock { available: 5 })
        ));
        assert!(matches!(
            check_available(0, 1),
            Err(CartError::InsufficientStock { available: 0 })
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CartError::InsufficientStock { available: 2 }.to_string(),
            "insufficient stock: only 2 available"
        );
    }
}
