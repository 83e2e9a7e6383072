//! Seed the catalog from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! solemart-cli seed products -f crates/cli/seed/products.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - name: Trail Runner
//!     price: 89.90
//!     category: Running
//!     description: Lightweight trail shoe
//!     quantity: 25
//!     seller_id: seller-1
//!     image_url: /shoes1.jpg
//! ```
//!
//! Entries whose name already exists are skipped, so the command can be rerun.

use std::path::Path;

use serde::Deserialize;

use solemart_server::db::{ProductRepository, RepositoryError};
use solemart_server::models::ProductInput;
use solemart_server::models::product::ValidProduct;

use super::{CommandError, connect};

/// Top-level shape of a seed file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<ProductInput>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Parse and validate every entry before anything is written.
fn parse_seed_file(contents: &str) -> Result<Vec<ValidProduct>, CommandError> {
    let file: SeedFile = serde_yaml::from_str(contents)?;

    file.products
        .into_iter()
        .map(|input| {
            let name = input.name.clone();
            input
                .validate()
                .map_err(|reason| CommandError::InvalidProduct { name, reason })
        })
        .collect()
}

/// Seed products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, any entry is invalid, or a
/// database operation fails. Validation happens before the first insert.
pub async fn products(file_path: &str) -> Result<SeedSummary, CommandError> {
    let contents = std::fs::read_to_string(Path::new(file_path)).map_err(|source| {
        CommandError::Io {
            path: file_path.to_owned(),
            source,
        }
    })?;
    let products = parse_seed_file(&contents)?;
    tracing::info!("Loaded {} products from {}", products.len(), file_path);

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for product in &products {
        match repo.create(product).await {
            Ok(created) => {
                tracing::info!("Created product {} ({})", created.name, created.id);
                summary.created += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!("Skipping existing product {}", product.name);
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Seeding complete: {} created, {} skipped",
        summary.created,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let yaml = r"
products:
  - name: Trail Runner
    price: 89.90
    category: Running
    quantity: 25
    seller_id: seller-1
  - name: Court Classic
    price: '64.50'
    category: Lifestyle
    description: Leather low-top
    quantity: 10
    seller_id: seller-2
    image_url: https://cdn.example/court.jpg
";
        let products = parse_seed_file(yaml).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Trail Runner");
        assert_eq!(products[0].price.to_string(), "89.90");
        assert_eq!(products[0].description, "");
        assert_eq!(products[1].image_url.as_deref(), Some("https://cdn.example/court.jpg"));
    }

    #[test]
    fn test_parse_seed_file_reports_invalid_entry() {
        let yaml = r"
products:
  - name: Broken
    price: -5
    category: Running
    quantity: 1
    seller_id: seller-1
";
        let err = parse_seed_file(yaml).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidProduct { ref name, .. } if name == "Broken"
        ));
    }

    #[test]
    fn test_parse_seed_file_rejects_wrong_shape() {
        assert!(matches!(
            parse_seed_file("- just a list"),
            Err(CommandError::Yaml(_))
        ));
    }
}
