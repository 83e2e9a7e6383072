//! Cart domain types and response projections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use solemart_core::{CartId, CartItemId, ProductId, Quantity};

/// A stored cart line, returned by add and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub variant_id: Option<String>,
    pub selected_options: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of merge-on-add.
#[derive(Debug, Clone, PartialEq)]
pub enum AddedItem {
    /// A new line was inserted.
    Inserted(CartItem),
    /// An existing line for the same product and variant was incremented.
    Merged(CartItem),
}

impl AddedItem {
    /// The resulting cart line.
    #[must_use]
    pub fn into_item(self) -> CartItem {
        match self {
            Self::Inserted(item) | Self::Merged(item) => item,
        }
    }
}

/// A line to add to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub variant_id: Option<String>,
    pub selected_options: Option<serde_json::Value>,
}

/// The caller's cart as returned by `GET /api/cart`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
}

/// One cart line with its product summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub variant_id: Option<String>,
    pub selected_options: Option<serde_json::Value>,
    pub product: Option<CartProductSummary>,
}

/// The product fields embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_view_serializes_camel_case() {
        let view = CartView {
            id: CartId::new(7),
            items: vec![CartItemView {
                id: CartItemId::new(11),
                product_id: ProductId::new(3),
                quantity: 5,
                variant_id: Some("size-42".to_string()),
                selected_options: Some(json!({"size": "42"})),
                product: Some(CartProductSummary {
                    id: ProductId::new(3),
                    name: "Court Classic".to_string(),
                    price: 49.5,
                }),
            }],
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "items": [{
                    "id": 11,
                    "productId": 3,
                    "quantity": 5,
                    "variantId": "size-42",
                    "selectedOptions": {"size": "42"},
                    "product": {"id": 3, "name": "Court Classic", "price": 49.5}
                }]
            })
        );
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView {
            id: CartId::new(1),
            items: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({"id": 1, "items": []})
        );
    }
}
