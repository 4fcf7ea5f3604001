//! Product catalog route handlers.
//!
//! Prices are shown for the caller's tier: list price for guests and retail
//! customers, business price for approved B2B customers.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use roastline_core::{CustomerTier, ProductId};

use crate::db::{Page, ProductFilter, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Paginated, PricedVariant, Product, ProductView, Variant};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// List active products.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Paginated<ProductView>>> {
    let tier = caller_tier(&state, user.as_ref()).await?;
    let page = Page::new(query.page, query.per_page);
    let filter = ProductFilter {
        query: query.q,
        category: query.category,
    };

    let repo = ProductRepository::new(state.pool());
    let (products, total) = repo.list_active(&filter, page).await?;
    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let variants = repo.active_variants_for(&ids).await?;

    Ok(Json(Paginated {
        items: with_variants(
            products,
            variants,
            tier,
            state.config().b2b_discount_percent,
        ),
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Product detail by slug.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let tier = caller_tier(&state, user.as_ref()).await?;
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {slug} not found")))?;
    let variants = repo.active_variants_for(&[product.id]).await?;

    with_variants(
        vec![product],
        variants,
        tier,
        state.config().b2b_discount_percent,
    )
    .pop()
    .map(Json)
    .ok_or_else(|| AppError::Internal("product view lost".to_string()))
}

/// Distinct categories of active products.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// The caller's current tier. Guests pay list price.
async fn caller_tier(state: &AppState, user: Option<&CurrentUser>) -> Result<CustomerTier> {
    match user {
        Some(user) => Ok(UserRepository::new(state.pool()).get_tier(user.id).await?),
        None => Ok(CustomerTier::B2c),
    }
}

/// Attach priced variants to their products, keeping product order.
fn with_variants(
    products: Vec<Product>,
    variants: Vec<Variant>,
    tier: CustomerTier,
    b2b_discount_percent: Decimal,
) -> Vec<ProductView> {
    let mut by_product: HashMap<ProductId, Vec<PricedVariant>> = HashMap::new();
    for variant in &variants {
        by_product
            .entry(variant.product_id)
            .or_default()
            .push(PricedVariant::new(variant, tier, b2b_discount_percent));
    }

    products
        .into_iter()
        .map(|product| ProductView {
            variants: by_product.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use roastline_core::VariantId;

    use super::*;

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Coffee {id}"),
            slug: format!("coffee-{id}"),
            description: String::new(),
            category: "single-origin".to_string(),
            origin: None,
            roast_level: None,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(id: i32, product_id: i32, price: i64) -> Variant {
        Variant {
            id: VariantId::new(id),
            product_id: ProductId::new(product_id),
            sku: format!("SKU-{id}"),
            name: "250g".to_string(),
            price: Decimal::from(price),
            b2b_price: None,
            weight_grams: 250,
            stock: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_with_variants_groups_by_product() {
        let views = with_variants(
            vec![product(2), product(1)],
            vec![variant(10, 1, 90_000), variant(11, 2, 80_000), variant(12, 1, 150_000)],
            CustomerTier::B2c,
            Decimal::from(15),
        );

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].product.id, ProductId::new(2));
        assert_eq!(views[0].variants.len(), 1);
        assert_eq!(views[1].variants.len(), 2);
    }

    #[test]
    fn test_with_variants_prices_for_tier() {
        let views = with_variants(
            vec![product(1)],
            vec![variant(10, 1, 100_000)],
            CustomerTier::B2b,
            Decimal::from(15),
        );
        let priced = &views[0].variants[0];
        assert_eq!(priced.list_price, Decimal::from(100_000));
        assert_eq!(priced.price, Decimal::from(85_000));
    }

    #[test]
    fn test_product_without_variants_is_kept() {
        let views = with_variants(vec![product(1)], vec![], CustomerTier::B2c, Decimal::from(15));
        assert!(views[0].variants.is_empty());
    }
}
