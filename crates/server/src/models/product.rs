//! Product domain types and payload validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solemart_core::{Price, ProductId};

/// Maximum product name length in characters.
pub const MAX_NAME_LENGTH: usize = 200;
/// Maximum category length in characters.
pub const MAX_CATEGORY_LENGTH: usize = 100;
/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// A catalog product as stored (raw row shape on the wire).
///
/// `price` serializes as an exact decimal string (`"19.90"`).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub seller_id: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized buyer-facing catalog entry returned by `GET /api/products`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i32,
    pub image: String,
}

impl CatalogEntry {
    /// Project a product, substituting `placeholder` when no image is stored.
    #[must_use]
    pub fn from_product(product: Product, placeholder: &str) -> Self {
        let image = product
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| placeholder.to_owned());

        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.as_f64(),
            quantity: product.quantity,
            image,
        }
    }
}

/// Full product payload (create and replace).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
    pub seller_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A product payload that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub price: Price,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub seller_id: String,
    pub image_url: Option<String>,
}

/// Partial product payload. Absent fields keep their stored value.
///
/// `name` is only ever used to locate the target on the buyer route; it is
/// never written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A validated partial update. The name is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidProductPatch {
    pub price: Option<Price>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub seller_id: Option<String>,
    pub image_url: Option<String>,
}

/// Collects `field: message` pairs and joins them into one error string.
#[derive(Debug, Default)]
struct Violations(Vec<String>);

impl Violations {
    fn push(&mut self, field: &str, message: impl std::fmt::Display) {
        self.0.push(format!("{field}: {message}"));
    }

    fn into_result<T>(self, value: T) -> Result<T, String> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0.join("; "))
        }
    }
}

fn check_name(name: &str, v: &mut Violations) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        v.push("name", "must not be empty");
    } else if trimmed.chars().count() > MAX_NAME_LENGTH {
        v.push("name", format!("must be at most {MAX_NAME_LENGTH} characters"));
    }
    trimmed.to_owned()
}

fn check_price(price: Decimal, v: &mut Violations) -> Option<Price> {
    Price::new(price).map_err(|e| v.push("price", e)).ok()
}

fn check_category(category: &str, v: &mut Violations) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        v.push("category", "must not be empty");
    } else if trimmed.chars().count() > MAX_CATEGORY_LENGTH {
        v.push(
            "category",
            format!("must be at most {MAX_CATEGORY_LENGTH} characters"),
        );
    }
    trimmed.to_owned()
}

fn check_description(description: &str, v: &mut Violations) {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        v.push(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
    }
}

fn check_quantity(quantity: i32, v: &mut Violations) {
    if quantity < 0 {
        v.push("quantity", "must not be negative");
    }
}

fn check_seller_id(seller_id: &str, v: &mut Violations) -> String {
    let trimmed = seller_id.trim();
    if trimmed.is_empty() {
        v.push("seller_id", "must not be empty");
    }
    trimmed.to_owned()
}

fn check_image_url(image_url: Option<&str>, v: &mut Violations) -> Option<String> {
    let url = image_url.map(str::trim).filter(|url| !url.is_empty())?;
    if !(url.starts_with('/') || url.starts_with("http://") || url.starts_with("https://")) {
        v.push(
            "image_url",
            "must be an absolute path or an http(s) URL",
        );
    }
    Some(url.to_owned())
}

impl ProductInput {
    /// Validate every field, reporting all violations at once.
    ///
    /// # Errors
    ///
    /// Returns the joined `field: message` list when any field is invalid.
    pub fn validate(self) -> Result<ValidProduct, String> {
        let mut v = Violations::default();

        let name = check_name(&self.name, &mut v);
        let price = check_price(self.price, &mut v);
        let category = check_category(&self.category, &mut v);
        check_description(&self.description, &mut v);
        check_quantity(self.quantity, &mut v);
        let seller_id = check_seller_id(&self.seller_id, &mut v);
        let image_url = check_image_url(self.image_url.as_deref(), &mut v);

        let (Some(price), true) = (price, v.0.is_empty()) else {
            return Err(v.0.join("; "));
        };

        Ok(ValidProduct {
            name,
            price,
            category,
            description: self.description,
            quantity: self.quantity,
            seller_id,
            image_url,
        })
    }
}

impl ProductPatch {
    /// Validate the supplied fields with the same rules as [`ProductInput`].
    ///
    /// # Errors
    ///
    /// Returns the joined `field: message` list when any supplied field is invalid.
    pub fn validate(self) -> Result<ValidProductPatch, String> {
        let mut v = Violations::default();

        let price = self.price.and_then(|p| check_price(p, &mut v));
        let category = self.category.as_deref().map(|c| check_category(c, &mut v));
        if let Some(description) = self.description.as_deref() {
            check_description(description, &mut v);
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity, &mut v);
        }
        let seller_id = self.seller_id.as_deref().map(|s| check_seller_id(s, &mut v));
        let image_url = check_image_url(self.image_url.as_deref(), &mut v);

        v.into_result(ValidProductPatch {
            price,
            category,
            description: self.description,
            quantity: self.quantity,
            seller_id,
            image_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Trail Runner ".to_string(),
            price: Decimal::new(8999, 2),
            category: "Running".to_string(),
            description: "Lightweight trail shoe".to_string(),
            quantity: 12,
            seller_id: "seller-1".to_string(),
            image_url: Some("/shoes/trail.jpg".to_string()),
        }
    }

    #[test]
    fn test_validate_trims_and_accepts() {
        let product = input().validate().unwrap();
        assert_eq!(product.name, "Trail Runner");
        assert_eq!(product.price.to_string(), "89.99");
        assert_eq!(product.image_url.as_deref(), Some("/shoes/trail.jpg"));
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let mut bad = input();
        bad.name = "   ".to_string();
        bad.price = Decimal::new(-1, 0);
        bad.quantity = -3;

        let err = bad.validate().unwrap_err();
        assert_eq!(
            err,
            "name: must not be empty; price: must not be negative; quantity: must not be negative"
        );
    }

    #[test]
    fn test_validate_rejects_three_decimal_places() {
        let mut bad = input();
        bad.price = Decimal::new(10_001, 3);
        let err = bad.validate().unwrap_err();
        assert!(err.starts_with("price:"), "{err}");
    }

    #[test]
    fn test_validate_image_url_scheme() {
        let mut bad = input();
        bad.image_url = Some("ftp://cdn/shoe.png".to_string());
        assert!(bad.validate().unwrap_err().starts_with("image_url:"));

        let mut blank = input();
        blank.image_url = Some("  ".to_string());
        assert_eq!(blank.validate().unwrap().image_url, None);
    }

    #[test]
    fn test_patch_ignores_name_and_validates_supplied_fields() {
        let patch = ProductPatch {
            name: Some(String::new()),
            quantity: Some(4),
            ..ProductPatch::default()
        };
        let valid = patch.validate().unwrap();
        assert_eq!(valid.quantity, Some(4));
        assert_eq!(valid.price, None);

        let patch = ProductPatch {
            category: Some(String::new()),
            ..ProductPatch::default()
        };
        assert_eq!(
            patch.validate().unwrap_err(),
            "category: must not be empty"
        );
    }

    #[test]
    fn test_product_input_rejects_wrong_types() {
        let json = r#"{"name":"A","price":"oops","category":"c","quantity":1,"seller_id":"s"}"#;
        assert!(serde_json::from_str::<ProductInput>(json).is_err());

        let json = r#"{"name":"A","price":19.9,"category":"c","quantity":1,"seller_id":"s"}"#;
        let parsed: ProductInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.price, Decimal::new(199, 1));
        assert_eq!(parsed.description, "");
    }

    #[test]
    fn test_catalog_entry_uses_placeholder() {
        let product = Product {
            id: ProductId::new(3),
            name: "Court Classic".to_string(),
            price: Price::from_cents(4950).unwrap(),
            category: "Tennis".to_string(),
            description: String::new(),
            quantity: 2,
            seller_id: "s".to_string(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let entry = CatalogEntry::from_product(product, "/shoes1.jpg");
        assert_eq!(entry.image, "/shoes1.jpg");
        assert!((entry.price - 49.5).abs() < f64::EPSILON);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["price"], serde_json::json!(49.5));
        assert_eq!(json["id"], serde_json::json!(3));
    }
}
