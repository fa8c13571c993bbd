//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use skateparadise_core::checkout::CheckoutLine;
use skateparadise_core::{
    CartId, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, Quantity, Size,
    TrackingCode, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderWithItems};

/// Tracking codes are random; a collision is retried this many times.
const TRACKING_CODE_ATTEMPTS: usize = 5;

const ORDER_COLUMNS: &str = "o.id, o.cart_id, o.user_id, o.status, o.payment_method, \
    o.tracking_code, o.name, o.address, o.phone, o.total, o.created_at, o.updated_at";

/// Database row for `shop.order`.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    cart_id: CartId,
    user_id: Option<UserId>,
    status: OrderStatus,
    payment_method: Option<PaymentMethod>,
    tracking_code: String,
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let tracking_code = TrackingCode::parse(&row.tracking_code)
            .map_err(|e| RepositoryError::corrupt("tracking code", e))?;
        let total = Money::new(row.total).map_err(|e| RepositoryError::corrupt("total", e))?;
        Ok(Self {
            id: row.id,
            cart_id: row.cart_id,
            user_id: row.user_id,
            status: row.status,
            payment_method: row.payment_method,
            tracking_code,
            name: row.name,
            address: row.address,
            phone: row.phone,
            total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for `shop.order_item`.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: Option<ProductId>,
    product_name: String,
    size: Option<String>,
    quantity: i32,
    unit_price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let size = row
            .size
            .as_deref()
            .map(Size::parse)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("size", e))?;
        let quantity = Quantity::new(i64::from(row.quantity))
            .map_err(|e| RepositoryError::corrupt("quantity", e))?;
        let unit_price =
            Money::new(row.unit_price).map_err(|e| RepositoryError::corrupt("unit price", e))?;
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            size,
            quantity,
            unit_price,
        })
    }
}

/// Delivery and payment details for an order.
///
/// `None` fields are left unchanged on update.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its items by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.with_items(row).await
    }

    /// Get an order with its items by tracking code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order o WHERE o.tracking_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        self.with_items(row).await
    }

    /// Orders owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.order o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order = Order::try_from(row)?;
            let items = self.items(order.id).await?;
            orders.push(OrderWithItems { order, items });
        }
        Ok(orders)
    }

    /// Items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, product_id, product_name, size, quantity, unit_price
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    async fn with_items(
        &self,
        row: Option<OrderRow>,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;
        let items = self.items(order.id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// Update delivery and payment details. Only the supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn update_client_info(
        &self,
        id: OrderId,
        info: &ClientInfo,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.order AS o SET
                name = COALESCE($2, o.name),
                address = COALESCE($3, o.address),
                phone = COALESCE($4, o.phone),
                payment_method = COALESCE($5::shop.payment_method, o.payment_method),
                updated_at = now()
            WHERE o.id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(info.name.as_deref())
        .bind(info.address.as_deref())
        .bind(info.phone.as_deref())
        .bind(info.payment_method)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Order::try_from(row)
    }
}

// =============================================================================
// Transactional operations
// =============================================================================

/// Insert an order for `cart_id` under a fresh tracking code, with whatever
/// client details are already known.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the cart already has an order or no
/// unused tracking code was found.
pub async fn insert(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: Option<UserId>,
    total: Money,
    info: &ClientInfo,
) -> Result<Order, RepositoryError> {
    for _ in 0..TRACKING_CODE_ATTEMPTS {
        let code = TrackingCode::generate(&mut rand::rng());
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.order AS o
                (cart_id, user_id, tracking_code, total, name, address, phone, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tracking_code) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(cart_id)
        .bind(user_id)
        .bind(code.as_str())
        .bind(total.amount())
        .bind(info.name.as_deref())
        .bind(info.address.as_deref())
        .bind(info.phone.as_deref())
        .bind(info.payment_method)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "this cart already has an order"))?;

        if let Some(row) = row {
            return Order::try_from(row);
        }
        tracing::warn!(tracking_code = %code, "Tracking code collision, retrying");
    }

    Err(RepositoryError::Conflict(
        "could not allocate a tracking code".to_owned(),
    ))
}

/// Insert the frozen item snapshots of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[CheckoutLine],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r"
            INSERT INTO shop.order_item (order_id, product_id, product_name, size, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, product_name, size, quantity, unit_price
            ",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.size.as_ref().map(Size::as_str))
        .bind(line.quantity.get())
        .bind(line.unit_price.amount())
        .fetch_one(&mut *conn)
        .await?;
        items.push(OrderItem::try_from(row)?);
    }
    Ok(items)
}

/// Lock an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.order o WHERE o.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .map(Order::try_from)
    .transpose()
}

/// Lock an order by tracking code.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_tracking_code(
    conn: &mut PgConnection,
    code: &TrackingCode,
) -> Result<Option<Order>, RepositoryError> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.order o WHERE o.tracking_code = $1 FOR UPDATE"
    ))
    .bind(code.as_str())
    .fetch_optional(conn)
    .await?
    .map(Order::try_from)
    .transpose()
}

/// Set an order's status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no order has this ID.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        UPDATE shop.order AS o SET status = $2::shop.order_status, updated_at = now()
        WHERE o.id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Order::try_from(row)
}

/// Attach `user_id` to an order.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no order has this ID.
pub async fn set_owner(
    conn: &mut PgConnection,
    id: OrderId,
    user_id: UserId,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        UPDATE shop.order AS o SET user_id = $2, updated_at = now()
        WHERE o.id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Order::try_from(row)
}
