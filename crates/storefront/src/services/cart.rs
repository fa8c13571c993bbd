//! Cart operations with stock reservation.
//!
//! Adding to a cart reserves units on the product's ledger; reducing or
//! removing a line releases them. Each operation locks the cart first and the
//! stock levels second, the same order checkout uses.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use skateparadise_core::{CartCode, CartItemId, ProductId, Quantity, Size, UserId};

use super::ShopError;
use crate::db::carts;
use crate::db::{CartRepository, RepositoryError, products, stock};
use crate::models::{Cart, CartItem, CartView, CurrentUser};

/// Attempts at generating an unused code for a new user cart.
const CART_CODE_ATTEMPTS: usize = 3;

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIdentity {
    /// A guest cart addressed by its client-supplied code.
    Code(CartCode),
    /// The open cart of an authenticated user.
    User(UserId),
}

impl CartIdentity {
    /// Resolve the identity of a request: the cart code if given, else the
    /// authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if the code is malformed or neither is
    /// present.
    pub fn resolve(code: Option<&str>, user: Option<&CurrentUser>) -> Result<Self, ShopError> {
        match (code.map(str::trim).filter(|c| !c.is_empty()), user) {
            (Some(code), _) => CartCode::parse(code)
                .map(Self::Code)
                .map_err(|e| ShopError::Validation(format!("invalid cart_code: {e}"))),
            (None, Some(user)) => Ok(Self::User(user.id)),
            (None, None) => Err(ShopError::Validation("cart_code is required".to_owned())),
        }
    }
}

/// A change to a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Set the quantity outright.
    Set(Quantity),
    /// Add a signed delta, never going below one.
    Delta(i64),
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            carts: CartRepository::new(pool),
        }
    }

    /// The open cart for `identity`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the query fails.
    pub async fn find(&self, identity: &CartIdentity) -> Result<Option<Cart>, ShopError> {
        let cart = match identity {
            CartIdentity::Code(code) => self.carts.find_open_by_code(code).await?,
            CartIdentity::User(user_id) => self.carts.find_open_by_user(*user_id).await?,
        };
        Ok(cart)
    }

    /// The open cart with all its lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::CartNotFound` if there is no open cart.
    pub async fn get_cart(&self, identity: &CartIdentity) -> Result<CartView, ShopError> {
        let cart = self.find(identity).await?.ok_or(ShopError::CartNotFound)?;
        let lines = self.carts.lines(cart.id).await?;
        Ok(CartView { cart, lines })
    }

    /// Number of units in the open cart; zero when there is none.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if a query fails.
    pub async fn item_count(&self, identity: &CartIdentity) -> Result<i64, ShopError> {
        match self.find(identity).await? {
            Some(cart) => Ok(self.carts.item_count(cart.id).await?),
            None => Ok(0),
        }
    }

    /// Whether the open cart holds the product (in this size, if given).
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if a query fails.
    pub async fn product_in_cart(
        &self,
        identity: &CartIdentity,
        product_id: ProductId,
        size: Option<&Size>,
    ) -> Result<bool, ShopError> {
        match self.find(identity).await? {
            Some(cart) => Ok(self.carts.contains(cart.id, product_id, size).await?),
            None => Ok(false),
        }
    }

    /// Add units of a product to the cart, creating the cart if needed.
    ///
    /// An existing (product, size) line is incremented. Returns the cart so
    /// callers learn the code of a freshly created user cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for an unknown product, a size error,
    /// `ShopError::Validation` when the merged line would exceed
    /// `Quantity::MAX`, or `ShopError::InsufficientStock`. Nothing changes on
    /// error.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        product_id: ProductId,
        size: Option<&Size>,
        quantity: Quantity,
    ) -> Result<(Cart, CartItem), ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let cart = lock_or_create(&mut tx, identity).await?;
        let product = products::find(&mut tx, product_id)
            .await?
            .ok_or(ShopError::NotFound("product"))?;
        if let Some(line) = carts::lock_line(&mut tx, cart.id, product_id, size).await? {
            line.quantity
                .saturating_offset(i64::from(quantity.get()))
                .map_err(|e| ShopError::Validation(e.to_string()))?;
        }
        let mut ledger = stock::lock_ledger(&mut tx, product_id).await?;

        ledger
            .reserve(size, quantity)
            .map_err(|e| ShopError::from_stock(&product.name, e))?;

        let item = carts::upsert_item(&mut tx, cart.id, product_id, size, quantity).await?;
        carts::touch(&mut tx, cart.id).await?;
        stock::save_ledger(&mut tx, &ledger).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::debug!(cart_id = %cart.id, item_id = %item.id, "Item added to cart");
        Ok((cart, item))
    }

    /// Change a line's quantity, reserving or releasing the difference.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the item is not in the caller's cart
    /// and `ShopError::InsufficientStock` when an increase cannot be covered.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        identity: &CartIdentity,
        item_id: CartItemId,
        change: QuantityChange,
    ) -> Result<CartItem, ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let (cart, mut item) = lock_owned_item(&mut tx, identity, item_id).await?;
        let old = item.quantity;
        let new = match change {
            QuantityChange::Set(quantity) => quantity,
            QuantityChange::Delta(delta) => old
                .saturating_offset(delta)
                .map_err(|e| ShopError::Validation(e.to_string()))?,
        };

        if new != old {
            let mut ledger = stock::lock_ledger(&mut tx, item.product_id).await?;
            let diff = Quantity::new((i64::from(new.get()) - i64::from(old.get())).abs())
                .map_err(|e| ShopError::Validation(e.to_string()))?;
            if new > old {
                let product = products::find(&mut tx, item.product_id)
                    .await?
                    .ok_or(ShopError::NotFound("product"))?;
                ledger
                    .reserve(item.size.as_ref(), diff)
                    .map_err(|e| ShopError::from_stock(&product.name, e))?;
            } else {
                ledger.release(item.size.as_ref(), diff);
            }

            carts::set_item_quantity(&mut tx, item.id, new).await?;
            carts::touch(&mut tx, cart.id).await?;
            stock::save_ledger(&mut tx, &ledger).await?;
            item.quantity = new;
        }
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(item)
    }

    /// Delete a line and release its units.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the item is not in the caller's cart.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(
        &self,
        identity: &CartIdentity,
        item_id: CartItemId,
    ) -> Result<(), ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let (cart, item) = lock_owned_item(&mut tx, identity, item_id).await?;
        let mut ledger = stock::lock_ledger(&mut tx, item.product_id).await?;
        ledger.release(item.size.as_ref(), item.quantity);

        carts::delete_item(&mut tx, item.id).await?;
        carts::touch(&mut tx, cart.id).await?;
        stock::save_ledger(&mut tx, &ledger).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(())
    }

    /// Attach the open cart with `code` to `user`.
    ///
    /// Claiming a cart the user already owns is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::CartNotFound` if no open cart has the code and
    /// `ShopError::Conflict` if another user owns it.
    pub async fn claim(&self, code: &CartCode, user: &CurrentUser) -> Result<Cart, ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut cart = carts::lock_open_by_code(&mut tx, code)
            .await?
            .ok_or(ShopError::CartNotFound)?;
        match cart.user_id {
            Some(owner) if owner == user.id => {}
            Some(_) => {
                return Err(ShopError::Conflict(
                    "cart belongs to another user".to_owned(),
                ));
            }
            None => {
                carts::set_owner(&mut tx, cart.id, user.id).await?;
                cart.user_id = Some(user.id);
                tracing::info!(cart_id = %cart.id, user_id = %user.id, "Cart claimed");
            }
        }
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(cart)
    }
}

/// Lock the open cart for `identity`.
pub(crate) async fn lock_existing(
    conn: &mut PgConnection,
    identity: &CartIdentity,
) -> Result<Cart, ShopError> {
    let cart = match identity {
        CartIdentity::Code(code) => carts::lock_open_by_code(conn, code).await?,
        CartIdentity::User(user_id) => carts::lock_open_by_user(conn, *user_id).await?,
    };
    cart.ok_or(ShopError::CartNotFound)
}

/// Lock the open cart for `identity`, opening one if there is none.
async fn lock_or_create(
    conn: &mut PgConnection,
    identity: &CartIdentity,
) -> Result<Cart, ShopError> {
    match identity {
        CartIdentity::Code(code) => Ok(carts::get_or_create_by_code(conn, code).await?),
        CartIdentity::User(user_id) => {
            if let Some(cart) = carts::lock_open_by_user(&mut *conn, *user_id).await? {
                return Ok(cart);
            }
            for _ in 0..CART_CODE_ATTEMPTS {
                let code = CartCode::generate(&mut rand::rng());
                match carts::insert_for_user(&mut *conn, &code, *user_id).await? {
                    Some(cart) => return Ok(cart),
                    None => tracing::warn!(cart_code = %code, "Cart code collision, retrying"),
                }
            }
            Err(ShopError::Conflict(
                "could not allocate a cart code".to_owned(),
            ))
        }
    }
}

/// Lock the caller's cart and one of its items.
async fn lock_owned_item(
    conn: &mut PgConnection,
    identity: &CartIdentity,
    item_id: CartItemId,
) -> Result<(Cart, CartItem), ShopError> {
    let cart = lock_existing(&mut *conn, identity).await?;
    let item = carts::lock_item(conn, cart.id, item_id)
        .await?
        .ok_or(ShopError::NotFound("cart item"))?;
    Ok((cart, item))
}
