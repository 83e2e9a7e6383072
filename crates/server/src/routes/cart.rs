//! Cart route handlers.
//!
//! Every handler takes the caller from [`RequireUser`], so anonymous requests
//! are rejected before any cart is created or touched. Item-level writes are
//! scoped to the caller's own cart.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use solemart_core::{CartItemId, ProductId, Quantity};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::models::cart::{AddedItem, CartItem, NewCartItem};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /api/cart`.
///
/// Ids and quantities are taken as raw JSON so that a missing or mistyped
/// field produces a field-specific message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(default)]
    pub product_id: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub selected_options: Option<Value>,
}

/// Body of `PATCH /api/cart`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub item_id: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
}

/// Query of `DELETE /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemQuery {
    pub item_id: Option<String>,
}

// =============================================================================
// Field Parsing
// =============================================================================

fn validation(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

/// A positive id given as a JSON integer or a numeric string.
fn parse_id(field: &str, value: Option<&Value>) -> Result<i32> {
    let id = match value {
        None | Some(Value::Null) => return Err(validation(format!("{field} required"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(validation(format!("{field} required")));
        }
        Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
        Some(_) => None,
    };

    id.filter(|id| *id > 0)
        .ok_or_else(|| validation(format!("{field} must be a positive integer")))
}

/// A quantity given as a JSON integer. Strings and fractions are rejected.
fn parse_quantity(value: &Value) -> Result<Quantity> {
    let raw = value
        .as_i64()
        .ok_or_else(|| validation("quantity must be an integer"))?;
    let raw = i32::try_from(raw).map_err(|_| validation("quantity is out of range"))?;
    Quantity::new(raw).map_err(|e| validation(e.to_string()))
}

fn parse_new_item(body: AddItemRequest) -> Result<NewCartItem> {
    let product_id = ProductId::new(parse_id("productId", body.product_id.as_ref())?);
    let quantity = match body.quantity {
        None | Some(Value::Null) => Quantity::ONE,
        Some(ref value) => parse_quantity(value)?,
    };
    let variant_id = body
        .variant_id
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty());
    let selected_options = body.selected_options.filter(|v| !v.is_null());

    Ok(NewCartItem {
        product_id,
        quantity,
        variant_id,
        selected_options,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// The caller's cart, created on first access.
///
/// # Route
///
/// `GET /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool()).view(user.id).await?;
    Ok(Json(cart))
}

/// Add a line, merging into an existing line for the same product and
/// variant. Responds 201 for a new line and 200 for a merge.
///
/// # Route
///
/// `POST /api/cart`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let item = parse_new_item(body)?;

    let added = CartRepository::new(state.pool())
        .add_item(user.id, &item)
        .await
        .map_err(AppError::not_found_as("Product"))?;

    let status = match added {
        AddedItem::Inserted(_) => StatusCode::CREATED,
        AddedItem::Merged(_) => StatusCode::OK,
    };
    let item = added.into_item();
    tracing::debug!(item_id = %item.id, quantity = item.quantity, "Cart line saved");

    Ok((status, Json(item)))
}

/// Set the quantity of one of the caller's lines.
///
/// # Route
///
/// `PATCH /api/cart`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<CartItem>> {
    let item_id = CartItemId::new(parse_id("itemId", body.item_id.as_ref())?);
    let quantity = match body.quantity {
        None | Some(Value::Null) => return Err(validation("quantity required")),
        Some(ref value) => parse_quantity(value)?,
    };

    let item = CartRepository::new(state.pool())
        .update_quantity(user.id, item_id, quantity)
        .await
        .map_err(AppError::not_found_as("Cart item"))?;

    Ok(Json(item))
}

/// Remove one of the caller's lines.
///
/// # Route
///
/// `DELETE /api/cart?itemId=X`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<RemoveItemQuery>,
) -> Result<Json<Value>> {
    let raw = query.item_id.map(Value::String);
    let item_id = CartItemId::new(parse_id("itemId", raw.as_ref())?);

    CartRepository::new(state.pool())
        .remove_item(user.id, item_id)
        .await
        .map_err(AppError::not_found_as("Cart item"))?;

    Ok(Json(json!({ "success": true })))
}

/// Remove every line from the caller's cart.
///
/// # Route
///
/// `DELETE /api/cart/items`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}
