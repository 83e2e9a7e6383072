//! Product repository for database operations.
//!
//! Every existence check is folded into the write itself: creation is a
//! conditional insert on the unique name, updates are `UPDATE ... RETURNING`
//! and zero rows means the product is gone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use solemart_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::{Product, ValidProduct, ValidProductPatch};

const PRODUCT_COLUMNS: &str =
    "id, name, price, category, description, quantity, seller_id, image_url, created_at, updated_at";

const NAME_TAKEN: &str = "Product already exists";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    category: String,
    description: String,
    quantity: i32,
    seller_id: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            category: row.category,
            description: row.description,
            quantity: row.quantity,
            seller_id: row.seller_id,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// How a partial update finds its target.
#[derive(Clone, Copy)]
enum Locator<'k> {
    Id(ProductId),
    Name(&'k str),
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products ordered by ID, optionally capped at `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product unless one with the same name exists.
    ///
    /// The existing row is left untouched on conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &ValidProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product
                (name, price, category, description, quantity, seller_id, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.seller_id)
        .bind(product.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict(NAME_TAKEN.to_owned()))?;

        Product::try_from(row)
    }

    /// Overwrite every mutable field of the product with this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new name belongs to another product.
    pub async fn replace_by_id(
        &self,
        id: ProductId,
        product: &ValidProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = $2, price = $3, category = $4, description = $5,
                quantity = $6, seller_id = $7, image_url = $8
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.seller_id)
        .bind(product.image_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, NAME_TAKEN))?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Overwrite every mutable field of the product named `product.name`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has that name.
    pub async fn replace_by_name(&self, product: &ValidProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET price = $2, category = $3, description = $4,
                quantity = $5, seller_id = $6, image_url = $7
            WHERE name = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.seller_id)
        .bind(product.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Merge the supplied fields into the product with this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn patch_by_id(
        &self,
        id: ProductId,
        patch: &ValidProductPatch,
    ) -> Result<Product, RepositoryError> {
        self.patch_where(Locator::Id(id), patch).await
    }

    /// Merge the supplied fields into the product named `name`. The name
    /// itself is never changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has that name.
    pub async fn patch_by_name(
        &self,
        name: &str,
        patch: &ValidProductPatch,
    ) -> Result<Product, RepositoryError> {
        self.patch_where(Locator::Name(name), patch).await
    }

    async fn patch_where(
        &self,
        locator: Locator<'_>,
        patch: &ValidProductPatch,
    ) -> Result<Product, RepositoryError> {
        let predicate = match locator {
            Locator::Id(_) => "id = $1",
            Locator::Name(_) => "name = $1",
        };
        let sql = format!(
            r"
            UPDATE shop.product
            SET price = COALESCE($2, price),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                quantity = COALESCE($5, quantity),
                seller_id = COALESCE($6, seller_id),
                image_url = COALESCE($7, image_url)
            WHERE {predicate}
            RETURNING {PRODUCT_COLUMNS}
            "
        );

        let query = sqlx::query_as::<_, ProductRow>(&sql);
        let query = match locator {
            Locator::Id(id) => query.bind(id),
            Locator::Name(name) => query.bind(name),
        };

        let row = query
            .bind(patch.price)
            .bind(patch.category.as_deref())
            .bind(patch.description.as_deref())
            .bind(patch.quantity)
            .bind(patch.seller_id.as_deref())
            .bind(patch.image_url.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product. Cart lines referencing it are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
