//! Cart repository for database operations.
//!
//! Carts are created lazily with a single upsert. Line merging relies on the
//! `cart_item_line_key` constraint: adding the same (product, variant) twice
//! increments the existing line instead of inserting a second one.
//!
//! Every item mutation is scoped to the caller's cart by joining on
//! `cart.user_id`, so an item ID from another user's cart behaves exactly
//! like an ID that does not exist.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use solemart_core::{CartId, CartItemId, Price, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::cart::{
    AddedItem, CartItem, CartItemView, CartProductSummary, CartView, NewCartItem,
};

const ITEM_COLUMNS: &str =
    "id, cart_id, product_id, quantity, variant_id, selected_options, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    quantity: i32,
    variant_id: Option<String>,
    selected_options: Option<Json<serde_json::Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            variant_id: row.variant_id,
            selected_options: row.selected_options.map(|Json(value)| value),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertedItemRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    inserted: bool,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    product_id: i32,
    quantity: i32,
    variant_id: Option<String>,
    selected_options: Option<Json<serde_json::Value>>,
    product_name: Option<String>,
    product_price: Option<Price>,
}

impl From<CartLineRow> for CartItemView {
    fn from(row: CartLineRow) -> Self {
        let product = match (row.product_name, row.product_price) {
            (Some(name), Some(price)) => Some(CartProductSummary {
                id: ProductId::new(row.product_id),
                name,
                price: price.as_f64(),
            }),
            _ => None,
        };

        Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            variant_id: row.variant_id,
            selected_options: row.selected_options.map(|Json(value)| value),
            product,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's cart ID, creating the cart if it does not exist.
    ///
    /// Concurrent first requests all resolve to the same single row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// foreign key violation when the user has been deleted).
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(CartId::new(id))
    }

    /// Load the user's cart with product summaries, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, RepositoryError> {
        let cart_id = self.get_or_create(user_id).await?;

        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.product_id, ci.quantity, ci.variant_id, ci.selected_options,
                   p.name AS product_name, p.price AS product_price
            FROM shop.cart_item ci
            LEFT JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(CartView {
            id: cart_id,
            items: rows.into_iter().map(CartItemView::from).collect(),
        })
    }

    /// Add a line to the user's cart, merging into an existing line for the
    /// same product and variant.
    ///
    /// On merge the quantities are summed and clamped to `Quantity::MAX`; the
    /// stored selected options are kept unless the request supplies new ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_item(
        &self,
        user_id: UserId,
        item: &NewCartItem,
    ) -> Result<AddedItem, RepositoryError> {
        let cart_id = self.get_or_create(user_id).await?;

        let row = sqlx::query_as::<_, UpsertedItemRow>(&format!(
            r"
            INSERT INTO shop.cart_item AS ci
                (cart_id, product_id, quantity, variant_id, selected_options)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT cart_item_line_key DO UPDATE
            SET quantity = LEAST(ci.quantity + EXCLUDED.quantity, $6),
                selected_options = COALESCE(EXCLUDED.selected_options, ci.selected_options)
            RETURNING {ITEM_COLUMNS}, (xmax = 0) AS inserted
            "
        ))
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.quantity.get())
        .bind(item.variant_id.as_deref())
        .bind(item.selected_options.as_ref().map(Json))
        .bind(Quantity::MAX)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        let inserted = row.inserted;
        let item = CartItem::from(row.item);
        Ok(if inserted {
            AddedItem::Inserted(item)
        } else {
            AddedItem::Merged(item)
        })
    }

    /// Set the quantity of a line in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist or
    /// belongs to another user's cart.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE shop.cart_item ci
            SET quantity = $3
            FROM shop.cart c
            WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            RETURNING ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.variant_id,
                      ci.selected_options, ci.created_at, ci.updated_at
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity.get())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(CartItem::from(row))
    }

    /// Remove a line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist or
    /// belongs to another user's cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from the user's cart. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
