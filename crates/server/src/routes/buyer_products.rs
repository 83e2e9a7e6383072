//! Product management addressed by product name.
//!
//! Writes on these routes locate their target by the `name` in the body.
//! `name` is a locator only and is never rewritten.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use tracing::instrument;

use solemart_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Product, ProductInput, ProductPatch};
use crate::state::AppState;

/// All products, raw rows.
///
/// # Route
///
/// `GET /api/buyer/products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(None).await?;
    Ok(Json(products))
}

/// A single product.
///
/// # Route
///
/// `GET /api/buyer/products/{id}`
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

/// Create a product. A duplicate name is rejected and the stored row is
/// left untouched.
///
/// # Route
///
/// `POST /api/buyer/products`
#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = input.validate().map_err(AppError::Validation)?;
    let created = ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(product_id = %created.id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Overwrite every mutable field of the product with the given name.
///
/// # Route
///
/// `PUT /api/buyer/products`
#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn replace(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let product = input.validate().map_err(AppError::Validation)?;
    let updated = ProductRepository::new(state.pool())
        .replace_by_name(&product)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    Ok(Json(updated))
}

/// Merge the supplied fields into the product with the given name.
///
/// # Route
///
/// `PATCH /api/buyer/products`
#[instrument(skip(state, patch))]
pub async fn patch(
    State(state): State<AppState>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let Some(name) = patch
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
    else {
        return Err(AppError::Validation("name required".to_string()));
    };

    let changes = patch.validate().map_err(AppError::Validation)?;
    let updated = ProductRepository::new(state.pool())
        .patch_by_name(&name, &changes)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    Ok(Json(updated))
}
