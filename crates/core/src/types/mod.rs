//! Core types for SkateParadise.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod code;
pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod size;
pub mod slug;
pub mod status;

pub use code::{CartCode, CodeError, TrackingCode};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use quantity::{Quantity, QuantityError};
pub use size::{Size, SizeError};
pub use slug::{Slug, slugify};
pub use status::*;
