//! Product, variant and stock management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use roastline_core::{ProductId, VariantId};

use super::paginated;
use crate::db::{CatalogRepository, Page};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{
    Paginated, Product, ProductInput, StockAdjustmentInput, Variant, VariantInput,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A product with every variant, inactive ones included.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub variant_id: VariantId,
    pub stock: i32,
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<Product>>> {
    let page = Page::new(query.page, query.per_page);
    let (items, total) = CatalogRepository::new(state.pool())
        .list_products(query.q.as_deref(), page)
        .await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    product_detail(&state, id).await.map(Json)
}

#[instrument(skip(state, admin, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let fields = body.validate().map_err(AppError::BadRequest)?;
    let product = CatalogRepository::new(state.pool())
        .create_product(&fields)
        .await?;

    info!(admin_id = %admin.id, product_id = %product.id, slug = %product.slug, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>> {
    let fields = body.validate().map_err(AppError::BadRequest)?;
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &fields)
        .await?;

    info!(admin_id = %admin.id, product_id = %id, "Product updated");
    Ok(Json(product))
}

/// Soft delete: the product disappears from the storefront only.
#[instrument(skip(state, admin))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .deactivate_product(id)
        .await?;

    info!(admin_id = %admin.id, product_id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, admin, body))]
pub async fn create_variant(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(product_id): Path<ProductId>,
    Json(body): Json<VariantInput>,
) -> Result<(StatusCode, Json<Variant>)> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let variant = CatalogRepository::new(state.pool())
        .create_variant(product_id, &input)
        .await?;

    info!(admin_id = %admin.id, variant_id = %variant.id, sku = %variant.sku, "Variant created");
    Ok((StatusCode::CREATED, Json(variant)))
}

/// Replace a variant. A `stock` field in the body is ignored.
#[instrument(skip(state, admin, body))]
pub async fn update_variant(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<VariantId>,
    Json(body): Json<VariantInput>,
) -> Result<Json<Variant>> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let variant = CatalogRepository::new(state.pool())
        .update_variant(id, &input)
        .await?;

    info!(admin_id = %admin.id, variant_id = %id, "Variant updated");
    Ok(Json(variant))
}

#[instrument(skip(state, admin))]
pub async fn deactivate_variant(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<VariantId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .deactivate_variant(id)
        .await?;

    info!(admin_id = %admin.id, variant_id = %id, "Variant deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a signed stock change. Going below zero is a 409.
#[instrument(skip(state, admin, body))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<VariantId>,
    Json(body): Json<StockAdjustmentInput>,
) -> Result<Json<StockLevel>> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let stock = CatalogRepository::new(state.pool())
        .adjust_stock(id, input.delta, &input.reason, admin.id)
        .await?;

    Ok(Json(StockLevel {
        variant_id: id,
        stock,
    }))
}

async fn product_detail(state: &AppState, id: ProductId) -> Result<ProductDetail> {
    let repo = CatalogRepository::new(state.pool());
    let product = repo
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let variants = repo.variants_of(id).await?;
    Ok(ProductDetail { product, variants })
}
