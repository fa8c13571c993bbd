//! Positive unit counts for cart and order lines.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Quantity above the per-line limit.
    #[error("quantity must be at most {max} (got {got})")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
        /// Requested quantity.
        got: i64,
    },
}

/// A line quantity, always in `1..=Quantity::MAX`.
///
/// Stored as `INTEGER`, so the inner value is an `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Upper bound for a single line.
    pub const MAX: i32 = 10_000;

    /// One unit.
    pub const ONE: Self = Self(1);

    /// Validate a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values below one and
    /// `QuantityError::TooLarge` above [`Quantity::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        match i32::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(QuantityError::TooLarge {
                max: Self::MAX,
                got: value,
            }),
        }
    }

    /// The quantity as stored in the database.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Apply a relative change, never going below one unit.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the result exceeds the line limit.
    pub fn saturating_offset(self, delta: i64) -> Result<Self, QuantityError> {
        Self::new(i64::from(self.0).saturating_add(delta).max(1))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
