//! Catalog route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use skateparadise_core::{Category, Money, ProductId, Slug};

use super::{ApiPath, ApiQuery};
use crate::error::Result;
use crate::models::{Product, ProductDetail};
use crate::services::catalog::{CatalogService, parse_category};
use crate::state::AppState;

/// Product as listed in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub price: Money,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            category: product.category,
            description: product.description.clone(),
            image: product.image.as_deref().map(image_url),
            available: product.available,
            created_at: product.created_at,
        }
    }
}

/// Stock of one size.
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    pub size: String,
    pub available: i32,
    pub enabled: bool,
}

/// Product with its sizes and sellable units.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub has_sizes: bool,
    pub sizes: Vec<SizeResponse>,
    pub stock: i32,
}

impl From<&ProductDetail> for ProductDetailResponse {
    fn from(detail: &ProductDetail) -> Self {
        let sizes = detail
            .levels
            .iter()
            .filter_map(|level| {
                level.size.as_ref().map(|size| SizeResponse {
                    size: size.as_str().to_owned(),
                    available: level.available_units(),
                    enabled: level.enabled,
                })
            })
            .collect();

        Self {
            product: ProductResponse::from(&detail.product),
            has_sizes: detail.has_sizes(),
            sizes,
            stock: detail.available_units(),
        }
    }
}

/// Public URL of a product image.
///
/// Stored values are paths under the media directory; absolute URLs from
/// imports are passed through.
pub(crate) fn image_url(image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_owned()
    } else {
        format!("/media/{}", image.trim_start_matches('/'))
    }
}

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

fn responses(products: &[Product]) -> Vec<ProductResponse> {
    products.iter().map(ProductResponse::from).collect()
}

/// List products, optionally filtered by category and search term.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let category = parse_category(query.category.as_deref())?;
    let products = CatalogService::new(state.pool())
        .list(category, query.search.as_deref())
        .await?;
    Ok(Json(responses(&products)))
}

/// Search products by name or description.
///
/// A missing search term lists everything.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = CatalogService::new(state.pool())
        .list(None, query.search.as_deref())
        .await?;
    Ok(Json(responses(&products)))
}

/// List the products of one category.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = CatalogService::new(state.pool())
        .list_by_category(&category)
        .await?;
    Ok(Json(responses(&products)))
}

/// Product detail by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetailResponse>> {
    let detail = CatalogService::new(state.pool()).get(id).await?;
    Ok(Json(ProductDetailResponse::from(&detail)))
}

/// Product detail by slug.
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ProductDetailResponse>> {
    let detail = CatalogService::new(state.pool()).get_by_slug(&slug).await?;
    Ok(Json(ProductDetailResponse::from(&detail)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skateparadise_core::Size;
    use skateparadise_core::stock::StockLevel;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            name: "Street Deck".to_owned(),
            slug: Slug::from_name("Street Deck"),
            price: Money::from_cents(5999),
            category: Some(Category::Boards),
            description: None,
            image: Some("products/deck.png".to_owned()),
            available: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_image_url() {
        assert_eq!(image_url("products/deck.png"), "/media/products/deck.png");
        assert_eq!(image_url("/products/deck.png"), "/media/products/deck.png");
        assert_eq!(
            image_url("https://cdn.example.com/deck.png"),
            "https://cdn.example.com/deck.png"
        );
    }

    #[test]
    fn test_detail_lists_sizes() {
        let detail = ProductDetail {
            product: product(),
            levels: vec![
                StockLevel {
                    id: None,
                    size: Some(Size::parse("8.0").unwrap()),
                    on_hand: 4,
                    reserved: 1,
                    enabled: true,
                },
                StockLevel {
                    id: None,
                    size: Some(Size::parse("8.5").unwrap()),
                    on_hand: 2,
                    reserved: 0,
                    enabled: false,
                },
            ],
        };

        let response = ProductDetailResponse::from(&detail);
        assert!(response.has_sizes);
        assert_eq!(response.sizes.len(), 2);
        assert_eq!(response.sizes[0].available, 3);
        assert_eq!(response.stock, 3);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["name"], "Street Deck");
        assert_eq!(json["image"], "/media/products/deck.png");
    }
}
