//! Buyer-facing catalog listing.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::models::CatalogEntry;
use crate::state::AppState;

/// Catalog listing, normalized for display.
///
/// Returns the first `listing_limit` products by id. Products without a
/// stored image get the configured placeholder.
///
/// # Route
///
/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CatalogEntry>>> {
    let catalog = &state.config().catalog;
    let products = ProductRepository::new(state.pool())
        .list(Some(catalog.listing_limit))
        .await?;

    let entries = products
        .into_iter()
        .map(|p| CatalogEntry::from_product(p, &catalog.placeholder_image))
        .collect();

    Ok(Json(entries))
}
