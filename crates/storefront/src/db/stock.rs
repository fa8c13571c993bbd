//! Stock ledger persistence.
//!
//! Every mutation follows the same shape: [`lock_ledgers`] re-reads the
//! affected `stock_level` rows with `FOR UPDATE` (ordered by product then
//! level id so concurrent transactions lock in the same order), the caller
//! applies a [`StockLedger`] transition, and [`save_ledger`] writes the rows
//! back and refreshes the product's `available` flag before commit.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use skateparadise_core::stock::{StockLedger, StockLevel};
use skateparadise_core::{ProductId, Size, StockLevelId};

use super::RepositoryError;

/// Database row for `shop.stock_level`.
#[derive(Debug, sqlx::FromRow)]
struct StockLevelRow {
    id: StockLevelId,
    product_id: ProductId,
    size: Option<String>,
    on_hand: i32,
    reserved: i32,
    enabled: bool,
}

impl TryFrom<StockLevelRow> for StockLevel {
    type Error = RepositoryError;

    fn try_from(row: StockLevelRow) -> Result<Self, Self::Error> {
        let size = row
            .size
            .as_deref()
            .map(Size::parse)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("size", e))?;
        Ok(Self {
            id: Some(row.id),
            size,
            on_hand: row.on_hand,
            reserved: row.reserved,
            enabled: row.enabled,
        })
    }
}

/// Stock levels of one product, without locking.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn levels_for(
    pool: &PgPool,
    product_id: ProductId,
) -> Result<Vec<StockLevel>, RepositoryError> {
    let rows = sqlx::query_as::<_, StockLevelRow>(
        r"
        SELECT id, product_id, size, on_hand, reserved, enabled
        FROM shop.stock_level
        WHERE product_id = $1
        ORDER BY id
        ",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(StockLevel::try_from).collect()
}

/// Lock and load the ledgers of `product_ids`.
///
/// Every requested product gets an entry, empty if it has no levels.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_ledgers(
    conn: &mut PgConnection,
    product_ids: &[ProductId],
) -> Result<HashMap<ProductId, StockLedger>, RepositoryError> {
    let ids: Vec<i64> = product_ids.iter().map(ProductId::as_i64).collect();
    let rows = sqlx::query_as::<_, StockLevelRow>(
        r"
        SELECT id, product_id, size, on_hand, reserved, enabled
        FROM shop.stock_level
        WHERE product_id = ANY($1)
        ORDER BY product_id, id
        FOR UPDATE
        ",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut levels: HashMap<ProductId, Vec<StockLevel>> = product_ids
        .iter()
        .map(|&id| (id, Vec::new()))
        .collect();
    for row in rows {
        let product_id = row.product_id;
        levels
            .entry(product_id)
            .or_default()
            .push(StockLevel::try_from(row)?);
    }

    Ok(levels
        .into_iter()
        .map(|(id, levels)| (id, StockLedger::new(id, levels)))
        .collect())
}

/// Lock and load a single product's ledger.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_ledger(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<StockLedger, RepositoryError> {
    let mut ledgers = lock_ledgers(conn, &[product_id]).await?;
    Ok(ledgers
        .remove(&product_id)
        .unwrap_or_else(|| StockLedger::new(product_id, Vec::new())))
}

/// Write a ledger back and recompute the product's availability.
///
/// Levels with an id are updated in place; levels without one are inserted.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if an inserted size already exists and
/// `RepositoryError::Database` for other failures.
pub async fn save_ledger(
    conn: &mut PgConnection,
    ledger: &StockLedger,
) -> Result<(), RepositoryError> {
    for level in ledger.levels() {
        match level.id {
            Some(id) => {
                sqlx::query(
                    r"
                    UPDATE shop.stock_level
                    SET on_hand = $2, reserved = $3, enabled = $4
                    WHERE id = $1
                    ",
                )
                .bind(id)
                .bind(level.on_hand)
                .bind(level.reserved)
                .bind(level.enabled)
                .execute(&mut *conn)
                .await?;
            }
            None => {
                sqlx::query(
                    r"
                    INSERT INTO shop.stock_level (product_id, size, on_hand, reserved, enabled)
                    VALUES ($1, $2, $3, $4, $5)
                    ",
                )
                .bind(ledger.product_id())
                .bind(level.size.as_ref().map(Size::as_str))
                .bind(level.on_hand)
                .bind(level.reserved)
                .bind(level.enabled)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    RepositoryError::conflict_on_unique(e, "this size already exists")
                })?;
            }
        }
    }

    set_availability(conn, ledger).await
}

/// Delete one stock level and recompute availability from the remaining ledger.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn delete_level(
    conn: &mut PgConnection,
    level_id: StockLevelId,
    remaining: &StockLedger,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.stock_level WHERE id = $1")
        .bind(level_id)
        .execute(&mut *conn)
        .await?;

    set_availability(conn, remaining).await
}

async fn set_availability(
    conn: &mut PgConnection,
    ledger: &StockLedger,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.product SET available = $2 WHERE id = $1")
        .bind(ledger.product_id())
        .bind(ledger.is_available())
        .execute(conn)
        .await?;
    Ok(())
}
