//! SkateParadise Core - Domain types and stock rules.
//!
//! This crate provides the types and pure business rules shared by the
//! SkateParadise components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, accounts)
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no database access,
//! no HTTP. Repositories load rows, hand them to the rules defined here, and
//! persist whatever the rules decide.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, quantities, codes and statuses
//! - [`stock`] - The per-product stock ledger (reserve, release, commit)
//! - [`checkout`] - All-or-nothing planning of an order from cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod stock;
pub mod types;

pub use types::*;
