//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login and JWT issuance
//! - `catalog` - Product reads and stock maintenance
//! - `cart` - Cart lines with stock reservation
//! - `orders` - All-or-nothing checkout and order lifecycle
//! - `favorites` - Guest wishlists
//! - `contact` - Contact form
//!
//! Services borrow the pool, open their own transactions and return
//! [`ShopError`] (or [`auth::AuthError`]), which the HTTP layer maps to
//! status codes.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
mod error;
pub mod favorites;
pub mod orders;

pub use error::ShopError;
