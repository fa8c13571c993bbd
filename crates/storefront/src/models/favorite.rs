//! Guest wishlist entries.

use chrono::{DateTime, Utc};

use skateparadise_core::{CartCode, FavoriteId};

use super::Product;

/// A product saved to a guest wishlist.
#[derive(Debug, Clone)]
pub struct Favorite {
    pub id: FavoriteId,
    pub session_code: CartCode,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}
