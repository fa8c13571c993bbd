//! Catalog reads and stock maintenance.

use sqlx::{PgConnection, PgPool};

use skateparadise_core::stock::StockLedger;
use skateparadise_core::{Category, Money, ProductId, Size, Slug};

use super::ShopError;
use crate::db::products::{self, NewProduct};
use crate::db::{ProductRepository, RepositoryError, stock};
use crate::models::{Product, ProductDetail};

/// Initial stock of a new product.
#[derive(Debug, Clone)]
pub enum InitialStock {
    /// One sizeless level.
    Flat(i32),
    /// One level per size.
    Sized(Vec<(Size, i32)>),
}

/// Input for a new product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: Money,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: InitialStock,
}

/// Parse an optional category name (case-insensitive). Blank means none.
///
/// # Errors
///
/// Returns `ShopError::Validation` for an unknown category.
pub fn parse_category(name: Option<&str>) -> Result<Option<Category>, ShopError> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::parse::<Category>)
        .transpose()
        .map_err(|e| ShopError::Validation(e.to_string()))
}

/// Catalog service.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
        }
    }

    /// List products, optionally by category and search term.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the query fails.
    pub async fn list(
        &self,
        category: Option<Category>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, ShopError> {
        Ok(self.products.list(category, search).await?)
    }

    /// List products of a category given by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for an unknown category.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, ShopError> {
        let category = parse_category(Some(category))?;
        self.list(category, None).await
    }

    /// Get a product with its sizes.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<ProductDetail, ShopError> {
        self.products
            .get(id)
            .await?
            .ok_or(ShopError::NotFound("product"))
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no product has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductDetail, ShopError> {
        self.products
            .get_by_slug(slug)
            .await?
            .ok_or(ShopError::NotFound("product"))
    }

    /// Create a product and its stock levels.
    ///
    /// The slug is derived from the name, suffixed `-1`, `-2`, ... if taken.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for an empty name or invalid stock, and
    /// `ShopError::Conflict` if the name is taken.
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductDetail, ShopError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ShopError::Validation("product name is required".to_owned()));
        }

        let base = Slug::from_name(name);
        let taken = self.products.taken_slugs(&base).await?;
        let new = NewProduct {
            name: name.to_owned(),
            slug: base.first_free(&taken),
            price: input.price,
            category: input.category,
            description: input.description,
            image: input.image,
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let product = products::insert(&mut tx, &new)
            .await
            .map_err(ShopError::or_not_found("product"))?;

        let mut ledger = StockLedger::new(product.id, Vec::new());
        match input.stock {
            InitialStock::Flat(on_hand) => ledger
                .set_on_hand(None, on_hand)
                .map_err(|e| ShopError::from_stock(&product.name, e))?,
            InitialStock::Sized(sizes) => {
                for (size, on_hand) in sizes {
                    ledger
                        .add_size(size, on_hand)
                        .map_err(|e| ShopError::from_stock(&product.name, e))?;
                }
            }
        }
        stock::save_ledger(&mut tx, &ledger)
            .await
            .map_err(ShopError::or_not_found("product"))?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        self.get(product.id).await
    }

    /// Set the units on hand of one level (restock or correction).
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for an unknown product and a validation
    /// error if `size` does not address a level.
    pub async fn restock(
        &self,
        product_id: ProductId,
        size: Option<&Size>,
        on_hand: i32,
    ) -> Result<ProductDetail, ShopError> {
        self.with_ledger(product_id, |product, ledger| {
            ledger
                .set_on_hand(size, on_hand)
                .map_err(|e| ShopError::from_stock(&product.name, e))
        })
        .await?;
        tracing::info!(%product_id, size = ?size.map(Size::as_str), on_hand, "Stock level set");
        self.get(product_id).await
    }

    /// Add a size level.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Conflict` if the size already exists and
    /// `ShopError::Validation` if the product is stocked without sizes.
    pub async fn add_size(
        &self,
        product_id: ProductId,
        size: Size,
        on_hand: i32,
    ) -> Result<ProductDetail, ShopError> {
        self.with_ledger(product_id, |product, ledger| {
            ledger
                .add_size(size, on_hand)
                .map(|_| ())
                .map_err(|e| ShopError::from_stock(&product.name, e))
        })
        .await?;
        self.get(product_id).await
    }

    /// Enable or disable a size level.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if the size does not exist.
    pub async fn set_size_enabled(
        &self,
        product_id: ProductId,
        size: &Size,
        enabled: bool,
    ) -> Result<ProductDetail, ShopError> {
        self.with_ledger(product_id, |product, ledger| {
            ledger
                .set_enabled(size, enabled)
                .map_err(|e| ShopError::from_stock(&product.name, e))
        })
        .await?;
        self.get(product_id).await
    }

    /// Remove a size level and recompute availability.
    ///
    /// Cart lines holding this size keep their quantity but can no longer
    /// check out.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if the size does not exist.
    pub async fn remove_size(
        &self,
        product_id: ProductId,
        size: &Size,
    ) -> Result<ProductDetail, ShopError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let product = require_product(&mut tx, product_id).await?;
        let mut ledger = stock::lock_ledger(&mut tx, product_id).await?;

        let removed = ledger
            .remove_size(size)
            .map_err(|e| ShopError::from_stock(&product.name, e))?;
        if let Some(level_id) = removed.id {
            stock::delete_level(&mut tx, level_id, &ledger).await?;
        }
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(%product_id, size = %size, "Size level removed");
        self.get(product_id).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no product has this ID.
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), ShopError> {
        self.products
            .delete(product_id)
            .await
            .map_err(ShopError::or_not_found("product"))?;
        tracing::info!(%product_id, "Product deleted");
        Ok(())
    }

    /// Lock a product's ledger, apply `change` and save it.
    async fn with_ledger<F>(&self, product_id: ProductId, change: F) -> Result<(), ShopError>
    where
        F: FnOnce(&Product, &mut StockLedger) -> Result<(), ShopError>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let product = require_product(&mut tx, product_id).await?;
        let mut ledger = stock::lock_ledger(&mut tx, product_id).await?;

        change(&product, &mut ledger)?;

        stock::save_ledger(&mut tx, &ledger)
            .await
            .map_err(ShopError::or_not_found("product"))?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }
}

async fn require_product(conn: &mut PgConnection, id: ProductId) -> Result<Product, ShopError> {
    products::find(conn, id)
        .await?
        .ok_or(ShopError::NotFound("product"))
}
