//! Product repository for catalog reads and product maintenance.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use skateparadise_core::{Category, Money, ProductId, Slug};

use super::RepositoryError;
use super::stock;
use crate::models::{Product, ProductDetail};

/// Columns selected for every product query, in `ProductRow` order.
pub(crate) const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.slug, p.price, p.category, p.description, p.image, p.available, p.created_at";

/// Database row for `shop.product`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    price: Decimal,
    category: Option<Category>,
    description: Option<String>,
    image: Option<String>,
    available: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Money::new(row.price).map_err(|e| RepositoryError::corrupt("price", e))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: Slug::from(row.slug),
            price,
            category: row.category,
            description: row.description,
            image: row.image,
            available: row.available,
            created_at: row.created_at,
        })
    }
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: Slug,
    pub price: Money,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first, optionally filtered by category and a
    /// case-insensitive search over name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<Category>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            WHERE ($1::shop.product_category IS NULL OR p.category = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2)
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(category)
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product and its stock levels by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.with_levels(row).await
    }

    /// Get a product and its stock levels by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        self.with_levels(row).await
    }

    async fn with_levels(
        &self,
        row: Option<ProductRow>,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let product = Product::try_from(row)?;
        let levels = stock::levels_for(self.pool, product.id).await?;
        Ok(Some(ProductDetail { product, levels }))
    }

    /// Slugs already taken by `base` or `base-N`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn taken_slugs(&self, base: &Slug) -> Result<HashSet<String>, RepositoryError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r"
            SELECT slug FROM shop.product
            WHERE slug = $1 OR slug LIKE $2
            ",
        )
        .bind(base.as_str())
        .bind(format!("{}-%", base.as_str().replace('_', "\\_")))
        .fetch_all(self.pool)
        .await?;

        Ok(slugs.into_iter().collect())
    }

    /// Delete a product. Stock levels, cart lines and favorites cascade; order
    /// items keep their snapshot with a null product reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Insert a product row. Availability starts false until stock is saved.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the name or slug is taken.
pub async fn insert(conn: &mut PgConnection, new: &NewProduct) -> Result<Product, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r"
        INSERT INTO shop.product AS p (name, slug, price, category, description, image)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(&new.name)
    .bind(new.slug.as_str())
    .bind(new.price.amount())
    .bind(new.category)
    .bind(new.description.as_deref())
    .bind(new.image.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::conflict_on_unique(e, "a product with this name already exists"))?;

    Product::try_from(row)
}

/// Load one product inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .map(Product::try_from)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("deck"), "%deck%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
