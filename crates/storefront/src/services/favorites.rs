//! Guest wishlists keyed by session code.

use sqlx::PgPool;

use skateparadise_core::{CartCode, ProductId};

use super::ShopError;
use crate::db::FavoriteRepository;
use crate::models::Favorite;

/// Parse a session code.
///
/// # Errors
///
/// Returns `ShopError::Validation` if the code is missing or malformed.
pub fn parse_session_code(code: Option<&str>) -> Result<CartCode, ShopError> {
    let code = code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ShopError::Validation("session_code is required".to_owned()))?;
    CartCode::parse(code).map_err(|e| ShopError::Validation(format!("invalid session_code: {e}")))
}

/// Favorites service.
pub struct FavoriteService<'a> {
    favorites: FavoriteRepository<'a>,
}

impl<'a> FavoriteService<'a> {
    /// Create a new favorites service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            favorites: FavoriteRepository::new(pool),
        }
    }

    /// Favorites of a session.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the query fails.
    pub async fn list(&self, session: &CartCode) -> Result<Vec<Favorite>, ShopError> {
        Ok(self.favorites.list(session).await?)
    }

    /// Add a product; returns `false` when it was already a favorite.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the product does not exist.
    pub async fn add(&self, session: &CartCode, product_id: ProductId) -> Result<bool, ShopError> {
        self.favorites
            .add(session, product_id)
            .await
            .map_err(ShopError::or_not_found("product"))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if it was not a favorite.
    pub async fn remove(&self, session: &CartCode, product_id: ProductId) -> Result<(), ShopError> {
        self.favorites
            .remove(session, product_id)
            .await
            .map_err(ShopError::or_not_found("favorite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_code_required() {
        assert!(parse_session_code(None).is_err());
        assert!(parse_session_code(Some("")).is_err());
        assert!(parse_session_code(Some("no spaces allowed")).is_err());
        assert!(parse_session_code(Some("guest-42")).is_ok());
    }
}
