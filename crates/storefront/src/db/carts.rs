//! Cart repository.
//!
//! A cart is "open" while `paid` is false. The partial unique index
//! `cart_open_code_key` guarantees at most one open cart per code, so a paid
//! cart's code can start a fresh cart.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use skateparadise_core::{CartCode, CartId, CartItemId, ProductId, Quantity, Size, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{Cart, CartItem, CartLine, Product};

const CART_COLUMNS: &str = "c.id, c.cart_code, c.user_id, c.paid, c.created_at, c.modified_at";

/// Database row for `shop.cart`.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    cart_code: String,
    user_id: Option<UserId>,
    paid: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let cart_code =
            CartCode::parse(&row.cart_code).map_err(|e| RepositoryError::corrupt("cart code", e))?;
        Ok(Self {
            id: row.id,
            cart_code,
            user_id: row.user_id,
            paid: row.paid,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

/// Database row for `shop.cart_item`.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    item_id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    size: Option<String>,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let size = row
            .size
            .as_deref()
            .map(Size::parse)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("size", e))?;
        let quantity = Quantity::new(i64::from(row.quantity))
            .map_err(|e| RepositoryError::corrupt("quantity", e))?;
        Ok(Self {
            id: row.item_id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            size,
            quantity,
        })
    }
}

/// A cart item joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            item: CartItem::try_from(row.item)?,
            product: Product::try_from(row.product)?,
        })
    }
}

const ITEM_COLUMNS: &str =
    "ci.id AS item_id, ci.cart_id, ci.product_id, ci.size, ci.quantity";

/// Repository for cart reads.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The open cart with this code, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_open_by_code(&self, code: &CartCode) -> Result<Option<Cart>, RepositoryError> {
        sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM shop.cart c WHERE c.cart_code = $1 AND NOT c.paid"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?
        .map(Cart::try_from)
        .transpose()
    }

    /// The most recently modified open cart owned by `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_open_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        sqlx::query_as::<_, CartRow>(&format!(
            r"
            SELECT {CART_COLUMNS} FROM shop.cart c
            WHERE c.user_id = $1 AND NOT c.paid
            ORDER BY c.modified_at DESC, c.id DESC
            LIMIT 1
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Cart::try_from)
        .transpose()
    }

    /// All lines of a cart with their products, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT {ITEM_COLUMNS}, {PRODUCT_COLUMNS}
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            "
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Total units in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, cart_id: CartId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM shop.cart_item WHERE cart_id = $1",
        )
        .bind(cart_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Whether the cart holds `product_id`; with a size, only that exact line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        size: Option<&Size>,
    ) -> Result<bool, RepositoryError> {
        let found: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM shop.cart_item
                WHERE cart_id = $1 AND product_id = $2
                  AND ($3::text IS NULL OR size = $3)
            )
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(size.map(Size::as_str))
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }
}

// =============================================================================
// Transactional operations
// =============================================================================

/// Lock the open cart with this code.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_open_by_code(
    conn: &mut PgConnection,
    code: &CartCode,
) -> Result<Option<Cart>, RepositoryError> {
    sqlx::query_as::<_, CartRow>(&format!(
        "SELECT {CART_COLUMNS} FROM shop.cart c WHERE c.cart_code = $1 AND NOT c.paid FOR UPDATE"
    ))
    .bind(code.as_str())
    .fetch_optional(conn)
    .await?
    .map(Cart::try_from)
    .transpose()
}

/// Lock the most recent open cart owned by `user_id`.
///
/// Takes a transaction-scoped advisory lock on the user first, so two
/// concurrent requests cannot both decide the user has no cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_open_by_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, CartRow>(&format!(
        r"
        SELECT {CART_COLUMNS} FROM shop.cart c
        WHERE c.user_id = $1 AND NOT c.paid
        ORDER BY c.modified_at DESC, c.id DESC
        LIMIT 1
        FOR UPDATE
        "
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .map(Cart::try_from)
    .transpose()
}

/// Open a cart for `code` unless one is already open, then lock it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_or_create_by_code(
    conn: &mut PgConnection,
    code: &CartCode,
) -> Result<Cart, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.cart (cart_code) VALUES ($1)
        ON CONFLICT (cart_code) WHERE NOT paid DO NOTHING
        ",
    )
    .bind(code.as_str())
    .execute(&mut *conn)
    .await?;

    lock_open_by_code(conn, code)
        .await?
        .ok_or(RepositoryError::NotFound)
}

/// Insert a new open cart owned by `user_id` under `code`.
///
/// Returns `None` when an open cart already uses `code`; the transaction
/// stays usable so the caller can retry with another code.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_for_user(
    conn: &mut PgConnection,
    code: &CartCode,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    sqlx::query_as::<_, CartRow>(&format!(
        r"
        INSERT INTO shop.cart AS c (cart_code, user_id) VALUES ($1, $2)
        ON CONFLICT (cart_code) WHERE NOT paid DO NOTHING
        RETURNING {CART_COLUMNS}
        "
    ))
    .bind(code.as_str())
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .map(Cart::try_from)
    .transpose()
}

/// Attach `user_id` to a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_owner(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart SET user_id = $2, modified_at = now() WHERE id = $1")
        .bind(cart_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Bump a cart's `modified_at`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn touch(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart SET modified_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Close a cart after checkout.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn mark_paid(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart SET paid = TRUE, modified_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Lock the lines of a cart with their products (checkout snapshot).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(&format!(
        r"
        SELECT {ITEM_COLUMNS}, {PRODUCT_COLUMNS}
        FROM shop.cart_item ci
        JOIN shop.product p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        FOR UPDATE OF ci
        "
    ))
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(CartLine::try_from).collect()
}

/// Lock one item, only if it belongs to `cart_id`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
) -> Result<Option<CartItem>, RepositoryError> {
    sqlx::query_as::<_, CartItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM shop.cart_item ci WHERE ci.id = $1 AND ci.cart_id = $2 FOR UPDATE"
    ))
    .bind(item_id)
    .bind(cart_id)
    .fetch_optional(conn)
    .await?
    .map(CartItem::try_from)
    .transpose()
}

/// Lock the (cart, product, size) line, if the cart has one.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    size: Option<&Size>,
) -> Result<Option<CartItem>, RepositoryError> {
    sqlx::query_as::<_, CartItemRow>(&format!(
        r"
        SELECT {ITEM_COLUMNS} FROM shop.cart_item ci
        WHERE ci.cart_id = $1 AND ci.product_id = $2
          AND ci.size IS NOT DISTINCT FROM $3
        FOR UPDATE
        "
    ))
    .bind(cart_id)
    .bind(product_id)
    .bind(size.map(Size::as_str))
    .fetch_optional(conn)
    .await?
    .map(CartItem::try_from)
    .transpose()
}

/// Add `quantity` to the (cart, product, size) line, creating it if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    size: Option<&Size>,
    quantity: Quantity,
) -> Result<CartItem, RepositoryError> {
    let row = sqlx::query_as::<_, CartItemRow>(&format!(
        r"
        INSERT INTO shop.cart_item AS ci (cart_id, product_id, size, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT ON CONSTRAINT cart_item_line_key
        DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity
        RETURNING {ITEM_COLUMNS}
        "
    ))
    .bind(cart_id)
    .bind(product_id)
    .bind(size.map(Size::as_str))
    .bind(quantity.get())
    .fetch_one(conn)
    .await?;

    CartItem::try_from(row)
}

/// Set the quantity of an item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_item_quantity(
    conn: &mut PgConnection,
    item_id: CartItemId,
    quantity: Quantity,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.cart_item SET quantity = $2 WHERE id = $1")
        .bind(item_id)
        .bind(quantity.get())
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete an item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_item(conn: &mut PgConnection, item_id: CartItemId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_item WHERE id = $1")
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(())
}
