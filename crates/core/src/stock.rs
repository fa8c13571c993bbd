//! Per-product stock ledger with an optional size dimension.
//!
//! A product is stocked either by exactly one sizeless level or by one or
//! more sized levels. Each level tracks units physically held (`on_hand`) and
//! units held by open carts (`reserved`):
//!
//! - adding to a cart **reserves** units (`reserved += q`),
//! - reducing or removing a cart line **releases** them (`reserved -= q`),
//! - checkout **commits** them (`on_hand -= q`, `reserved -= q`).
//!
//! The ledger is pure: callers load the levels under a row lock, apply one of
//! these transitions, and write the levels back in the same transaction.

use serde::{Deserialize, Serialize};

use crate::{ProductId, Quantity, Size, StockLevelId};

/// Errors from stock ledger transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    /// The product is sold in sizes but no size was given.
    #[error("a size is required for this product")]
    SizeRequired,
    /// The product is sold in sizes, but not this one.
    #[error("size {0} is not offered for this product")]
    UnknownSize(Size),
    /// A size was given for a product sold without sizes.
    #[error("this product is not sold in sizes")]
    SizeNotOffered,
    /// Fewer units are available than requested.
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient {
        /// Units requested.
        requested: i32,
        /// Units that could have been taken.
        available: i32,
    },
    /// The size already has a level.
    #[error("size {0} already exists for this product")]
    DuplicateSize(Size),
    /// Sized and sizeless levels cannot be mixed on one product.
    #[error("a product is stocked either with sizes or without, not both")]
    MixedSizing,
    /// Stock counts cannot go below zero.
    #[error("stock cannot be negative")]
    NegativeStock,
}

/// One row of the ledger: stock for a single (product, size) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Database id, `None` until inserted.
    pub id: Option<StockLevelId>,
    /// Size label, `None` for the single level of a sizeless product.
    pub size: Option<Size>,
    /// Units physically held.
    pub on_hand: i32,
    /// Units held by open carts.
    pub reserved: i32,
    /// Whether this level may be sold at all.
    pub enabled: bool,
}

impl StockLevel {
    /// A new, enabled level with nothing reserved.
    #[must_use]
    pub const fn new(size: Option<Size>, on_hand: i32) -> Self {
        Self {
            id: None,
            size,
            on_hand,
            reserved: 0,
            enabled: true,
        }
    }

    /// Units that can still be put in a cart: `max(0, on_hand - reserved)`.
    #[must_use]
    pub fn available_units(&self) -> i32 {
        (self.on_hand - self.reserved).max(0)
    }

    /// Enabled with at least one available unit.
    #[must_use]
    pub fn is_sellable(&self) -> bool {
        self.enabled && self.available_units() > 0
    }
}

/// All stock levels of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLedger {
    product_id: ProductId,
    levels: Vec<StockLevel>,
}

impl StockLedger {
    /// Wrap the levels loaded for `product_id`.
    #[must_use]
    pub const fn new(product_id: ProductId, levels: Vec<StockLevel>) -> Self {
        Self { product_id, levels }
    }

    /// The product this ledger belongs to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// The levels, in load order.
    #[must_use]
    pub fn levels(&self) -> &[StockLevel] {
        &self.levels
    }

    /// Consume the ledger, returning its levels.
    #[must_use]
    pub fn into_levels(self) -> Vec<StockLevel> {
        self.levels
    }

    /// Whether the product is sold in sizes.
    #[must_use]
    pub fn has_sizes(&self) -> bool {
        self.levels.iter().any(|l| l.size.is_some())
    }

    /// Aggregate availability: some enabled level has available units.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.levels.iter().any(StockLevel::is_sellable)
    }

    /// Find the level addressed by `size`.
    ///
    /// `Ok(None)` means a sizeless request against a product with no levels
    /// at all, which holds no stock.
    fn position(&self, size: Option<&Size>) -> Result<Option<usize>, StockError> {
        match size {
            None if self.has_sizes() => Err(StockError::SizeRequired),
            None => Ok(self.levels.iter().position(|l| l.size.is_none())),
            Some(_) if !self.has_sizes() => Err(StockError::SizeNotOffered),
            Some(wanted) => self
                .levels
                .iter()
                .position(|l| l.size.as_ref() == Some(wanted))
                .map(Some)
                .ok_or_else(|| StockError::UnknownSize(wanted.clone())),
        }
    }

    /// Check that `size` addresses a level of this product.
    ///
    /// # Errors
    ///
    /// Returns `SizeRequired`, `SizeNotOffered` or `UnknownSize`.
    pub fn validate_size(&self, size: Option<&Size>) -> Result<(), StockError> {
        self.position(size).map(|_| ())
    }

    /// The level addressed by `size`, if any.
    #[must_use]
    pub fn level(&self, size: Option<&Size>) -> Option<&StockLevel> {
        self.position(size)
            .ok()
            .flatten()
            .and_then(|i| self.levels.get(i))
    }

    /// Units of `size` that can still be reserved (zero when disabled).
    #[must_use]
    pub fn available_units(&self, size: Option<&Size>) -> i32 {
        self.level(size)
            .filter(|l| l.enabled)
            .map_or(0, StockLevel::available_units)
    }

    /// Reserve `quantity` units for a cart.
    ///
    /// # Errors
    ///
    /// Returns a size error if `size` does not address a level, and
    /// `StockError::Insufficient` if the level is disabled or holds fewer
    /// available units than requested. The ledger is unchanged on error.
    pub fn reserve(&mut self, size: Option<&Size>, quantity: Quantity) -> Result<(), StockError> {
        let requested = quantity.get();
        let level = self
            .position(size)?
            .and_then(|i| self.levels.get_mut(i))
            .ok_or(StockError::Insufficient {
                requested,
                available: 0,
            })?;

        let available = if level.enabled {
            level.available_units()
        } else {
            0
        };
        if available < requested {
            return Err(StockError::Insufficient {
                requested,
                available,
            });
        }
        level.reserved += requested;
        Ok(())
    }

    /// Return up to `quantity` reserved units to the available pool.
    ///
    /// Releasing against a level that no longer exists is a no-op, so a cart
    /// line can always be reduced or removed after a size is withdrawn.
    /// Returns whether a level was touched.
    pub fn release(&mut self, size: Option<&Size>, quantity: Quantity) -> bool {
        let Some(level) = self
            .position(size)
            .ok()
            .flatten()
            .and_then(|i| self.levels.get_mut(i))
        else {
            return false;
        };
        level.reserved -= level.reserved.min(quantity.get());
        true
    }

    /// Move `quantity` units out of stock for a completed order.
    ///
    /// Consumes the cart's reservation as far as it covers the quantity.
    ///
    /// # Errors
    ///
    /// Returns a size error if `size` does not address a level, and
    /// `StockError::Insufficient` if fewer than `quantity` units are on hand.
    /// The ledger is unchanged on error.
    pub fn commit(&mut self, size: Option<&Size>, quantity: Quantity) -> Result<(), StockError> {
        let requested = quantity.get();
        let level = self
            .position(size)?
            .and_then(|i| self.levels.get_mut(i))
            .ok_or(StockError::Insufficient {
                requested,
                available: 0,
            })?;

        if level.on_hand < requested {
            return Err(StockError::Insufficient {
                requested,
                available: level.on_hand,
            });
        }
        level.on_hand -= requested;
        level.reserved -= level.reserved.min(requested);
        Ok(())
    }

    /// Set the units on hand for a level (restock or stock correction).
    ///
    /// A sizeless request against a product with no levels creates its flat
    /// level.
    ///
    /// # Errors
    ///
    /// Returns `NegativeStock` for negative counts and a size error if `size`
    /// does not address a level.
    pub fn set_on_hand(&mut self, size: Option<&Size>, on_hand: i32) -> Result<(), StockError> {
        if on_hand < 0 {
            return Err(StockError::NegativeStock);
        }
        match self.position(size)? {
            Some(i) => {
                if let Some(level) = self.levels.get_mut(i) {
                    level.on_hand = on_hand;
                }
            }
            None => self.levels.push(StockLevel::new(None, on_hand)),
        }
        Ok(())
    }

    /// Add a new sized level.
    ///
    /// # Errors
    ///
    /// Returns `NegativeStock`, `DuplicateSize`, or `MixedSizing` when the
    /// product already has a sizeless level.
    pub fn add_size(&mut self, size: Size, on_hand: i32) -> Result<&StockLevel, StockError> {
        if on_hand < 0 {
            return Err(StockError::NegativeStock);
        }
        if self.levels.iter().any(|l| l.size.is_none()) {
            return Err(StockError::MixedSizing);
        }
        if self.levels.iter().any(|l| l.size.as_ref() == Some(&size)) {
            return Err(StockError::DuplicateSize(size));
        }
        self.levels.push(StockLevel::new(Some(size), on_hand));
        self.levels.last().ok_or(StockError::MixedSizing)
    }

    /// Enable or disable a sized level.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSize` or `SizeNotOffered` if the level does not exist.
    pub fn set_enabled(&mut self, size: &Size, enabled: bool) -> Result<(), StockError> {
        if let Some(level) = self
            .position(Some(size))?
            .and_then(|i| self.levels.get_mut(i))
        {
            level.enabled = enabled;
        }
        Ok(())
    }

    /// Remove a sized level, returning it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSize` or `SizeNotOffered` if the level does not exist.
    pub fn remove_size(&mut self, size: &Size) -> Result<StockLevel, StockError> {
        self.position(Some(size))?
            .filter(|&i| i < self.levels.len())
            .map(|i| self.levels.remove(i))
            .ok_or_else(|| StockError::UnknownSize(size.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn q(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn size(s: &str) -> Size {
        Size::parse(s).unwrap()
    }

    fn flat(on_hand: i32) -> StockLedger {
        StockLedger::new(ProductId::new(1), vec![StockLevel::new(None, on_hand)])
    }

    fn sized(levels: &[(&str, i32)]) -> StockLedger {
        StockLedger::new(
            ProductId::new(2),
            levels
                .iter()
                .map(|(s, n)| StockLevel::new(Some(size(s)), *n))
                .collect(),
        )
    }

    #[test]
    fn test_reserve_release_scenario() {
        // Cart XYZ999 against a sizeless product with five units.
        let mut ledger = flat(5);

        ledger.reserve(None, q(3)).unwrap();
        assert_eq!(ledger.available_units(None), 2);

        let before = ledger.clone();
        assert_eq!(
            ledger.reserve(None, q(3)),
            Err(StockError::Insufficient {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(ledger, before);

        assert!(ledger.release(None, q(3)));
        assert_eq!(ledger.available_units(None), 5);
        assert_eq!(ledger.levels()[0].on_hand, 5);
    }

    #[test]
    fn test_last_unit_can_only_be_reserved_once() {
        let mut ledger = flat(1);
        assert!(ledger.reserve(None, q(1)).is_ok());
        assert!(matches!(
            ledger.reserve(None, q(1)),
            Err(StockError::Insufficient { available: 0, .. })
        ));
        assert!(!ledger.is_available());
    }

    #[test]
    fn test_commit_consumes_reservation() {
        let mut ledger = flat(5);
        ledger.reserve(None, q(2)).unwrap();
        ledger.commit(None, q(2)).unwrap();

        let level = &ledger.levels()[0];
        assert_eq!(level.on_hand, 3);
        assert_eq!(level.reserved, 0);
        assert_eq!(ledger.available_units(None), 3);
    }

    #[test]
    fn test_commit_rejects_more_than_on_hand() {
        let mut ledger = flat(2);
        let before = ledger.clone();
        assert_eq!(
            ledger.commit(None, q(3)),
            Err(StockError::Insufficient {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_release_never_goes_negative() {
        let mut ledger = flat(4);
        ledger.reserve(None, q(1)).unwrap();
        ledger.release(None, q(3));
        assert_eq!(ledger.levels()[0].reserved, 0);
    }

    #[test]
    fn test_size_resolution() {
        let ledger = sized(&[("8.0", 2), ("8.25", 0)]);
        assert_eq!(ledger.validate_size(None), Err(StockError::SizeRequired));
        assert_eq!(
            ledger.validate_size(Some(&size("9.0"))),
            Err(StockError::UnknownSize(size("9.0")))
        );
        assert!(ledger.validate_size(Some(&size("8.25"))).is_ok());

        assert_eq!(
            flat(3).validate_size(Some(&size("M"))),
            Err(StockError::SizeNotOffered)
        );
    }

    #[test]
    fn test_availability_follows_sellable_levels() {
        let mut ledger = sized(&[("S", 0), ("M", 1)]);
        assert!(ledger.is_available());

        ledger.set_enabled(&size("M"), false).unwrap();
        assert!(!ledger.is_available());
        assert_eq!(ledger.available_units(Some(&size("M"))), 0);

        ledger.set_on_hand(Some(&size("S")), 4).unwrap();
        assert!(ledger.is_available());

        ledger.remove_size(&size("S")).unwrap();
        assert!(!ledger.is_available());
    }

    #[test]
    fn test_disabled_level_cannot_be_reserved() {
        let mut ledger = sized(&[("42", 3)]);
        ledger.set_enabled(&size("42"), false).unwrap();
        assert_eq!(
            ledger.reserve(Some(&size("42")), q(1)),
            Err(StockError::Insufficient {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_empty_ledger_holds_no_stock() {
        let mut ledger = StockLedger::new(ProductId::new(9), Vec::new());
        assert!(!ledger.is_available());
        assert!(matches!(
            ledger.reserve(None, q(1)),
            Err(StockError::Insufficient { available: 0, .. })
        ));
        ledger.set_on_hand(None, 2).unwrap();
        assert!(ledger.is_available());
    }

    #[test]
    fn test_add_size_rules() {
        let mut ledger = sized(&[("M", 1)]);
        ledger.add_size(size("L"), 2).unwrap();
        assert_eq!(ledger.levels().len(), 2);
        assert_eq!(
            ledger.add_size(size("L"), 1).map(|_| ()),
            Err(StockError::DuplicateSize(size("L")))
        );
        assert_eq!(
            flat(1).add_size(size("L"), 1).map(|_| ()),
            Err(StockError::MixedSizing)
        );
        assert_eq!(
            ledger.set_on_hand(Some(&size("M")), -1),
            Err(StockError::NegativeStock)
        );
    }

    #[test]
    fn test_release_against_removed_size_is_noop() {
        let mut ledger = sized(&[("M", 1), ("L", 1)]);
        ledger.remove_size(&size("L")).unwrap();
        assert!(!ledger.release(Some(&size("L")), q(1)));
    }
}
