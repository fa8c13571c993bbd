//! Checkout and order lifecycle.

use std::collections::BTreeSet;

use sqlx::PgPool;
use tracing::instrument;

use skateparadise_core::checkout::{CheckoutLine, plan_checkout};
use skateparadise_core::{OrderId, OrderStatus, PaymentMethod, ProductId, TrackingCode, UserId};

use super::ShopError;
use super::cart::{self, CartIdentity};
use crate::db::orders::{self, ClientInfo};
use crate::db::{OrderRepository, RepositoryError, carts, stock};
use crate::models::{CurrentUser, Order, OrderWithItems};

/// Parse an optional payment method code (`CB` or `PP`).
///
/// # Errors
///
/// Returns `ShopError::Validation` for an unknown code.
pub fn parse_payment_method(code: Option<&str>) -> Result<Option<PaymentMethod>, ShopError> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::parse::<PaymentMethod>)
        .transpose()
        .map_err(|e| ShopError::Validation(e.to_string()))
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// Turn the open cart into an order.
    ///
    /// Runs in one transaction: the cart, its lines and every affected stock
    /// level are locked, each line is committed against stock, one order item
    /// per line freezes the product name and current price, and the cart is
    /// closed. If any line is short, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::CartNotFound` without an open cart,
    /// `ShopError::Conflict` when the cart was claimed by a different user,
    /// `ShopError::Validation` for an empty cart, and
    /// `ShopError::InsufficientStock` naming the first short product.
    #[instrument(skip(self, info))]
    pub async fn create_order(
        &self,
        identity: &CartIdentity,
        caller: Option<&CurrentUser>,
        info: &ClientInfo,
    ) -> Result<OrderWithItems, ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let cart = cart::lock_existing(&mut tx, identity).await?;
        let owner = match (cart.user_id, caller) {
            (Some(owner), Some(user)) if owner != user.id => {
                return Err(ShopError::Conflict(
                    "cart belongs to another user".to_owned(),
                ));
            }
            (Some(owner), _) => Some(owner),
            (None, caller) => caller.map(|u| u.id),
        };
        let lines = carts::lock_lines(&mut tx, cart.id).await?;

        let product_ids: Vec<ProductId> = lines
            .iter()
            .map(|l| l.item.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut ledgers = stock::lock_ledgers(&mut tx, &product_ids).await?;

        let snapshot = lines
            .into_iter()
            .map(|l| CheckoutLine {
                product_id: l.item.product_id,
                product_name: l.product.name,
                size: l.item.size,
                quantity: l.item.quantity,
                unit_price: l.product.price,
            })
            .collect();
        let draft = plan_checkout(snapshot, &mut ledgers)?;

        let order = orders::insert(&mut tx, cart.id, owner, draft.total, info).await?;
        let items = orders::insert_items(&mut tx, order.id, &draft.lines).await?;
        for product_id in &product_ids {
            if let Some(ledger) = ledgers.get(product_id) {
                stock::save_ledger(&mut tx, ledger).await?;
            }
        }
        carts::mark_paid(&mut tx, cart.id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_id = %order.id,
            tracking_code = %order.tracking_code,
            total = %order.total,
            items = items.len(),
            "Order created"
        );
        Ok(OrderWithItems { order, items })
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no order has this ID.
    pub async fn get(&self, id: OrderId) -> Result<OrderWithItems, ShopError> {
        self.orders
            .get(id)
            .await?
            .ok_or(ShopError::NotFound("order"))
    }

    /// Get an order by tracking code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the code is malformed or unknown.
    pub async fn get_by_tracking_code(&self, code: &str) -> Result<OrderWithItems, ShopError> {
        let code = TrackingCode::parse(code).map_err(|_| ShopError::NotFound("order"))?;
        self.orders
            .get_by_tracking_code(&code)
            .await?
            .ok_or(ShopError::NotFound("order"))
    }

    /// Orders owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if a query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, ShopError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Move an order forward through its statuses.
    ///
    /// Setting the current status again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidStatus` for an unknown status,
    /// `ShopError::Validation` for a backward move and `ShopError::NotFound`
    /// for an unknown order. The order is unchanged on error.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, ShopError> {
        let next: OrderStatus = status
            .parse()
            .map_err(|_| ShopError::InvalidStatus(status.to_owned()))?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let order = orders::lock(&mut tx, id)
            .await?
            .ok_or(ShopError::NotFound("order"))?;

        if order.status == next {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(ShopError::Validation(format!(
                "cannot move order from {} back to {next}",
                order.status
            )));
        }

        let order = orders::set_status(&mut tx, id, next)
            .await
            .map_err(ShopError::or_not_found("order"))?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
        Ok(order)
    }

    /// Overwrite the supplied delivery and payment fields, in any status.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no order has this ID.
    pub async fn update_client_info(
        &self,
        id: OrderId,
        info: &ClientInfo,
    ) -> Result<Order, ShopError> {
        self.orders
            .update_client_info(id, info)
            .await
            .map_err(ShopError::or_not_found("order"))
    }

    /// Attach an order to `user`, with the same rules as claiming a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for an unknown order and
    /// `ShopError::Conflict` if another user owns it.
    pub async fn claim(&self, id: OrderId, user: &CurrentUser) -> Result<Order, ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let order = orders::lock(&mut tx, id)
            .await?
            .ok_or(ShopError::NotFound("order"))?;

        let order = match order.user_id {
            Some(owner) if owner == user.id => order,
            Some(_) => {
                return Err(ShopError::Conflict(
                    "order belongs to another user".to_owned(),
                ));
            }
            None => {
                let order = orders::set_owner(&mut tx, id, user.id)
                    .await
                    .map_err(ShopError::or_not_found("order"))?;
                tracing::info!(order_id = %order.id, user_id = %user.id, "Order claimed");
                order
            }
        };
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payment_method() {
        assert_eq!(parse_payment_method(None).unwrap(), None);
        assert_eq!(parse_payment_method(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_payment_method(Some("PP")).unwrap(),
            Some(PaymentMethod::PayPal)
        );
        assert!(matches!(
            parse_payment_method(Some("BTC")),
            Err(ShopError::Validation(_))
        ));
    }
}
