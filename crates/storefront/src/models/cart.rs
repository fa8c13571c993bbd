//! Cart domain types.

use chrono::{DateTime, Utc};

use skateparadise_core::{CartCode, CartId, CartItemId, Money, ProductId, Quantity, Size, UserId};

use super::Product;

/// A shopping cart. At most one open (`paid == false`) cart exists per code.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub cart_code: CartCode,
    pub user_id: Option<UserId>,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One (product, size) line of a cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub size: Option<Size>,
    pub quantity: Quantity,
}

/// A cart line joined with its product.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    /// Current price of the line.
    #[must_use]
    pub fn total(&self) -> Money {
        self.product.price.times(self.item.quantity)
    }
}

/// A cart with all of its lines.
#[derive(Debug, Clone)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartView {
    /// Sum of line totals at current prices.
    #[must_use]
    pub fn sum_total(&self) -> Money {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn num_of_items(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| i64::from(l.item.quantity.get()))
            .sum()
    }
}
