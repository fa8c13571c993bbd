//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the JSON shapes in [`crate::routes`].

pub mod cart;
pub mod contact;
pub mod favorite;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartView};
pub use contact::ContactMessage;
pub use favorite::Favorite;
pub use order::{Order, OrderItem, OrderWithItems};
pub use product::{Product, ProductDetail};
pub use user::{CurrentUser, User};
