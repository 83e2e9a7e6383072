//! Product management addressed by product id.

use axum::{Json, extract::State};
use serde_json::json;
use tracing::instrument;

use solemart_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Product, ProductInput, ProductPatch};
use crate::state::AppState;

/// All products.
///
/// # Route
///
/// `GET /api/seller/products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(None).await?;
    Ok(Json(products))
}

/// # Route
///
/// `GET /api/seller/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Overwrite every field of a product, name included.
///
/// Renaming onto another product's name is a conflict.
///
/// # Route
///
/// `PUT /api/seller/products/{id}`
#[instrument(skip(state, input))]
pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let product = input.validate().map_err(AppError::Validation)?;
    let updated = ProductRepository::new(state.pool())
        .replace_by_id(id, &product)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    Ok(Json(updated))
}

/// Merge the supplied fields. A `name` in the body is ignored.
///
/// # Route
///
/// `PATCH /api/seller/products/{id}`
#[instrument(skip(state, patch))]
pub async fn patch(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let changes = patch.validate().map_err(AppError::Validation)?;
    let updated = ProductRepository::new(state.pool())
        .patch_by_id(id, &changes)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    Ok(Json(updated))
}

/// # Route
///
/// `DELETE /api/seller/products/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<serde_json::Value>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "success": true })))
}
