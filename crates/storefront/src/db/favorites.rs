//! Guest wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use skateparadise_core::{CartCode, FavoriteId, ProductId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{Favorite, Product};

/// A favorite joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct FavoriteRow {
    favorite_id: FavoriteId,
    session_code: String,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = RepositoryError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        let session_code = CartCode::parse(&row.session_code)
            .map_err(|e| RepositoryError::corrupt("session code", e))?;
        Ok(Self {
            id: row.favorite_id,
            session_code,
            product: Product::try_from(row.product)?,
            created_at: row.favorited_at,
        })
    }
}

/// Repository for wishlist entries.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorite repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Favorites of a session, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, session: &CartCode) -> Result<Vec<Favorite>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(&format!(
            r"
            SELECT f.id AS favorite_id, f.session_code, f.created_at AS favorited_at,
                   {PRODUCT_COLUMNS}
            FROM shop.favorite f
            JOIN shop.product p ON p.id = f.product_id
            WHERE f.session_code = $1
            ORDER BY f.created_at DESC, f.id DESC
            "
        ))
        .bind(session.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Favorite::try_from).collect()
    }

    /// Add a product to a session's favorites.
    ///
    /// Returns `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(
        &self,
        session: &CartCode,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.favorite (session_code, product_id)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT favorite_session_product_key DO NOTHING
            ",
        )
        .bind(session.as_str())
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a product from a session's favorites.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it was not a favorite.
    pub async fn remove(
        &self,
        session: &CartCode,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.favorite WHERE session_code = $1 AND product_id = $2")
                .bind(session.as_str())
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
