//! Catalog domain types.

use chrono::{DateTime, Utc};

use skateparadise_core::stock::{StockLedger, StockLevel};
use skateparadise_core::{Category, Money, ProductId, Slug};

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub price: Money,
    pub category: Option<Category>,
    pub description: Option<String>,
    /// Path relative to the media directory, or an absolute URL.
    pub image: Option<String>,
    /// Derived: some enabled stock level has available units.
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// A product together with its stock levels.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub levels: Vec<StockLevel>,
}

impl ProductDetail {
    /// Whether the product is sold in sizes.
    #[must_use]
    pub fn has_sizes(&self) -> bool {
        self.levels.iter().any(|l| l.size.is_some())
    }

    /// Units that can still be added to carts, across all enabled levels.
    #[must_use]
    pub fn available_units(&self) -> i32 {
        self.levels
            .iter()
            .filter(|l| l.enabled)
            .map(StockLevel::available_units)
            .sum()
    }

    /// View the levels as a ledger.
    #[must_use]
    pub fn ledger(&self) -> StockLedger {
        StockLedger::new(self.product.id, self.levels.clone())
    }
}
