//! Enumerations stored as Postgres enum types in the `shop` schema.

use serde::{Deserialize, Serialize};

/// Errors produced when parsing one of the enums in this module.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Not one of `pending`, `shipped`, `delivered`.
    #[error("invalid order status: {0}")]
    UnknownStatus(String),
    /// Not one of `CB`, `PP`.
    #[error("invalid payment method: {0}")]
    UnknownPaymentMethod(String),
    /// Not a catalog category.
    #[error("invalid category: {0}")]
    UnknownCategory(String),
}

/// Order fulfilment status.
///
/// Statuses only move forward: `pending` → `shipped` → `delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Whether an order may move from `self` to `next`.
    ///
    /// Skipping ahead (`pending` → `delivered`) is allowed; staying put is
    /// treated as a no-op by callers and reported here as `true`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(StatusError::UnknownStatus(s.to_owned())),
        }
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.payment_method"))]
pub enum PaymentMethod {
    /// Carte bancaire.
    #[serde(rename = "CB")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "CB"))]
    Card,
    /// `PayPal`.
    #[serde(rename = "PP")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "PP"))]
    PayPal,
}

impl PaymentMethod {
    /// Two-letter code as stored and serialized.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Card => "CB",
            Self::PayPal => "PP",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CB" => Ok(Self::Card),
            "PP" => Ok(Self::PayPal),
            _ => Err(StatusError::UnknownPaymentMethod(s.to_owned())),
        }
    }
}

/// Catalog category.
///
/// Variant names are the stored values and the public URL segments
/// (`/products/Boards/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.product_category"))]
pub enum Category {
    Boards,
    Trucks,
    Grips,
    Roues,
    Sweats,
    Vestes,
    Chaussures,
    Bonnets,
    Ceintures,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 9] = [
        Self::Boards,
        Self::Trucks,
        Self::Grips,
        Self::Roues,
        Self::Sweats,
        Self::Vestes,
        Self::Chaussures,
        Self::Bonnets,
        Self::Ceintures,
    ];

    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boards => "Boards",
            Self::Trucks => "Trucks",
            Self::Grips => "Grips",
            Self::Roues => "Roues",
            Self::Sweats => "Sweats",
            Self::Vestes => "Vestes",
            Self::Chaussures => "Chaussures",
            Self::Bonnets => "Bonnets",
            Self::Ceintures => "Ceintures",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = StatusError;

    /// Case-insensitive, so legacy lowercase values (`vestes`) still import.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StatusError::UnknownCategory(s.to_owned()))
    }
}
