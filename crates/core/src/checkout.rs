//! All-or-nothing checkout planning.
//!
//! [`plan_checkout`] turns a snapshot of cart lines into an order draft while
//! committing each line against its product's [`StockLedger`]. Either every
//! line commits and the ledgers are updated, or the first failing line is
//! reported and the ledgers are left exactly as they were.

use std::collections::HashMap;

use crate::stock::{StockError, StockLedger};
use crate::{Money, ProductId, Quantity, Size};

/// One cart line as captured at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub size: Option<Size>,
    pub quantity: Quantity,
    /// Current catalog price, frozen into the order.
    pub unit_price: Money,
}

impl CheckoutLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The lines and total of an order about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub lines: Vec<CheckoutLine>,
    pub total: Money,
}

/// Why a checkout could not be planned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,
    /// No ledger was loaded for a product in the cart.
    #[error("no stock ledger for product {0}")]
    MissingLedger(ProductId),
    /// A line could not be committed.
    #[error("{product_name}: {source}")]
    Stock {
        product_id: ProductId,
        product_name: String,
        #[source]
        source: StockError,
    },
}

/// Commit every line against `ledgers` and build the order draft.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty snapshot, and the first
/// line that cannot be committed otherwise. `ledgers` is only modified on
/// success.
pub fn plan_checkout(
    lines: Vec<CheckoutLine>,
    ledgers: &mut HashMap<ProductId, StockLedger>,
) -> Result<OrderDraft, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut staged = ledgers.clone();
    for line in &lines {
        let ledger = staged
            .get_mut(&line.product_id)
            .ok_or(CheckoutError::MissingLedger(line.product_id))?;
        ledger
            .commit(line.size.as_ref(), line.quantity)
            .map_err(|source| CheckoutError::Stock {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                source,
            })?;
    }

    *ledgers = staged;
    let total = lines.iter().map(CheckoutLine::line_total).sum();
    Ok(OrderDraft { lines, total })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::stock::StockLevel;

    fn eur(s: &str) -> Money {
        Money::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    fn line(id: i64, name: &str, size: Option<&str>, qty: i64, price: &str) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(id),
            product_name: name.to_owned(),
            size: size.map(|s| Size::parse(s).unwrap()),
            quantity: Quantity::new(qty).unwrap(),
            unit_price: eur(price),
        }
    }

    fn ledgers(entries: &[(i64, Option<&str>, i32, i32)]) -> HashMap<ProductId, StockLedger> {
        let mut map: HashMap<ProductId, StockLedger> = HashMap::new();
        for &(id, size, on_hand, reserved) in entries {
            let product_id = ProductId::new(id);
            let mut level = StockLevel::new(size.map(|s| Size::parse(s).unwrap()), on_hand);
            level.reserved = reserved;
            let ledger = map
                .remove(&product_id)
                .unwrap_or_else(|| StockLedger::new(product_id, Vec::new()));
            let mut levels = ledger.into_levels();
            levels.push(level);
            map.insert(product_id, StockLedger::new(product_id, levels));
        }
        map
    }

    #[test]
    fn test_plan_commits_every_line() {
        let mut stock = ledgers(&[(1, None, 5, 2), (2, Some("8.25"), 3, 1), (2, Some("8.5"), 1, 0)]);
        let lines = vec![
            line(1, "Grip Mob", None, 2, "9.90"),
            line(2, "Deck Baker", Some("8.25"), 1, "64.00"),
        ];

        let draft = plan_checkout(lines, &mut stock).unwrap();

        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.total, eur("83.80"));
        let grip = &stock[&ProductId::new(1)].levels()[0];
        assert_eq!((grip.on_hand, grip.reserved), (3, 0));
        let deck = stock[&ProductId::new(2)].level(Some(&Size::parse("8.25").unwrap())).unwrap();
        assert_eq!((deck.on_hand, deck.reserved), (2, 0));
    }

    #[test]
    fn test_plan_is_all_or_nothing() {
        let mut stock = ledgers(&[(1, None, 5, 1), (2, None, 1, 1), (3, None, 4, 1)]);
        let before = stock.clone();
        let lines = vec![
            line(1, "Trucks Indy", None, 1, "55.00"),
            line(2, "Roues Spitfire", None, 2, "42.00"),
            line(3, "Bonnet", None, 1, "19.00"),
        ];

        let err = plan_checkout(lines, &mut stock).unwrap_err();

        assert_eq!(
            err,
            CheckoutError::Stock {
                product_id: ProductId::new(2),
                product_name: "Roues Spitfire".to_owned(),
                source: StockError::Insufficient {
                    requested: 2,
                    available: 1
                },
            }
        );
        assert_eq!(stock, before);
    }

    #[test]
    fn test_plan_rejects_empty_cart() {
        let mut stock = HashMap::new();
        assert_eq!(
            plan_checkout(Vec::new(), &mut stock),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_plan_rejects_missing_ledger() {
        let mut stock = ledgers(&[(1, None, 5, 0)]);
        let lines = vec![line(7, "Ghost", None, 1, "1.00")];
        assert_eq!(
            plan_checkout(lines, &mut stock),
            Err(CheckoutError::MissingLedger(ProductId::new(7)))
        );
    }

    #[test]
    fn test_total_is_frozen_at_snapshot_prices() {
        let mut stock = ledgers(&[(1, None, 10, 0)]);
        let mut lines = vec![line(1, "Sweat", None, 3, "45.00")];
        let draft = plan_checkout(lines.clone(), &mut stock).unwrap();

        // A later catalog price change only affects new snapshots.
        lines[0].unit_price = eur("60.00");
        assert_eq!(draft.total, eur("135.00"));
        assert_eq!(
            draft.lines.iter().map(CheckoutLine::line_total).sum::<Money>(),
            draft.total
        );
    }
}
