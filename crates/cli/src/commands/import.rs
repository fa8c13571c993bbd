//! Catalog import command.
//!
//! Reads a JSON array of products:
//!
//! ```json
//! [
//!   {
//!     "name": "Street Deck",
//!     "description": "Maple, medium concave",
//!     "price": "59.99",
//!     "category": "Boards",
//!     "image": "street-deck.png",
//!     "sizes": [{"size": "8.0", "on_hand": 4}, {"size": "8.25", "on_hand": 2}]
//!   },
//!   { "name": "Wax", "price": "4.50", "category": "Grips", "stock": 20 }
//! ]
//! ```
//!
//! Products whose name already exists are skipped, so the import can be run
//! again after adding entries. Images are referenced under
//! `product_images/` in the media directory. The legacy `size` field (a
//! comma-separated list) gives every listed size `stock` units.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use skateparadise_core::{Money, Size};
use skateparadise_storefront::services::ShopError;
use skateparadise_storefront::services::catalog::{
    CatalogService, InitialStock, ProductInput, parse_category,
};

use super::{CommandError, connect};

/// Media subdirectory holding imported images.
const IMAGE_DIR: &str = "product_images";

/// Stock of one size.
#[derive(Debug, Deserialize)]
struct SizeRecord {
    size: String,
    on_hand: i32,
}

/// One product of the import file.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    name: String,
    price: Decimal,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    stock: i32,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    sizes: Vec<SizeRecord>,
}

impl ProductRecord {
    fn into_input(self) -> Result<ProductInput, ShopError> {
        let invalid = |e: &dyn std::fmt::Display| ShopError::Validation(e.to_string());

        let stock = if self.sizes.is_empty() {
            let legacy: Vec<&str> = self
                .size
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if legacy.is_empty() {
                InitialStock::Flat(self.stock)
            } else {
                InitialStock::Sized(
                    legacy
                        .into_iter()
                        .map(|label| Ok((Size::parse(label).map_err(|e| invalid(&e))?, self.stock)))
                        .collect::<Result<_, ShopError>>()?,
                )
            }
        } else {
            InitialStock::Sized(
                self.sizes
                    .into_iter()
                    .map(|s| Ok((Size::parse(&s.size).map_err(|e| invalid(&e))?, s.on_hand)))
                    .collect::<Result<_, ShopError>>()?,
            )
        };

        Ok(ProductInput {
            price: Money::new(self.price).map_err(|e| invalid(&e))?,
            category: parse_category(self.category.as_deref())?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            image: self
                .image
                .filter(|i| !i.trim().is_empty())
                .map(|i| format!("{IMAGE_DIR}/{}", i.trim())),
            name: self.name,
            stock,
        })
    }
}

/// Import products from a JSON file.
///
/// Invalid entries are logged and skipped; a database failure aborts.
pub async fn products(path: &Path) -> Result<(), CommandError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let records: Vec<ProductRecord> = serde_json::from_str(&raw)?;

    let pool = connect().await?;
    let catalog = CatalogService::new(&pool);

    let (mut created, mut skipped, mut invalid) = (0_usize, 0_usize, 0_usize);
    for record in records {
        let name = record.name.clone();
        let result = match record.into_input() {
            Ok(input) => catalog.create_product(input).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(detail) => {
                created += 1;
                tracing::info!(product_id = %detail.product.id, name = %name, "Created");
            }
            Err(ShopError::Conflict(_)) => {
                skipped += 1;
                tracing::info!(name = %name, "Already exists");
            }
            Err(ShopError::Repository(e)) => return Err(e.into()),
            Err(e) => {
                invalid += 1;
                tracing::warn!(name = %name, error = %e, "Skipped invalid product");
            }
        }
    }

    tracing::info!(created, skipped, invalid, "Import complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(value: serde_json::Value) -> ProductRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flat_record() {
        let input = record(serde_json::json!({
            "name": "Wax",
            "price": "4.50",
            "category": "grips",
            "stock": 20,
            "image": "wax.png",
        }))
        .into_input()
        .unwrap();

        assert!(matches!(input.stock, InitialStock::Flat(20)));
        assert_eq!(input.image.as_deref(), Some("product_images/wax.png"));
        assert!(input.category.is_some());
    }

    #[test]
    fn test_legacy_size_list() {
        let input = record(serde_json::json!({
            "name": "Hoodie",
            "price": "45",
            "stock": 3,
            "size": "S, M,,L",
        }))
        .into_input()
        .unwrap();

        let InitialStock::Sized(sizes) = input.stock else {
            panic!("expected sized stock");
        };
        let labels: Vec<&str> = sizes.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(labels, ["S", "M", "L"]);
        assert!(sizes.iter().all(|(_, n)| *n == 3));
    }

    #[test]
    fn test_explicit_sizes_win() {
        let input = record(serde_json::json!({
            "name": "Deck",
            "price": "59.99",
            "size": "ignored",
            "sizes": [{"size": "8.0", "on_hand": 4}],
        }))
        .into_input()
        .unwrap();

        assert!(matches!(input.stock, InitialStock::Sized(ref s) if s.len() == 1));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = record(serde_json::json!({
            "name": "Surfboard",
            "price": "300",
            "category": "Surf",
        }))
        .into_input();
        assert!(matches!(result, Err(ShopError::Validation(_))));
    }
}
