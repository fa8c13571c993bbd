//! Order domain types.

use chrono::{DateTime, Utc};

use skateparadise_core::{
    CartId, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, Quantity, Size,
    TrackingCode, UserId,
};

/// An order created from one cart.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub cart_id: CartId,
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub tracking_code: TrackingCode,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Sum of item snapshots, fixed at creation.
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen copy of one cart line.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub size: Option<Size>,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl OrderItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// An order with its items.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
