//! Catalog maintenance route handlers. Staff only.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use skateparadise_core::{Money, ProductId, Size};

use super::cart::parse_size;
use super::products::ProductDetailResponse;
use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::services::ShopError;
use crate::services::catalog::{CatalogService, InitialStock, ProductInput, parse_category};
use crate::state::AppState;

/// Stock of one size in a create request.
#[derive(Debug, Deserialize)]
pub struct SizeStockRequest {
    pub size: String,
    pub on_hand: i32,
}

/// New product form. Send either `stock` or `sizes`, not both.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<SizeStockRequest>>,
}

impl CreateProductRequest {
    fn into_input(self) -> std::result::Result<ProductInput, ShopError> {
        let stock = match (self.stock, self.sizes) {
            (Some(_), Some(_)) => {
                return Err(ShopError::Validation(
                    "send either stock or sizes, not both".to_owned(),
                ));
            }
            (None, Some(sizes)) => InitialStock::Sized(
                sizes
                    .into_iter()
                    .map(|s| Ok((required_size(&s.size)?, s.on_hand)))
                    .collect::<std::result::Result<_, ShopError>>()?,
            ),
            (stock, None) => InitialStock::Flat(stock.unwrap_or(0)),
        };

        Ok(ProductInput {
            name: self.name,
            price: Money::new(self.price).map_err(|e| ShopError::Validation(e.to_string()))?,
            category: parse_category(self.category.as_deref())?,
            description: self.description,
            image: self.image,
            stock,
        })
    }
}

/// Restock form. `size` is omitted for sizeless products.
#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub size: Option<String>,
    pub on_hand: i32,
}

/// Size enable/disable form.
#[derive(Debug, Deserialize)]
pub struct SizeEnabledRequest {
    pub enabled: bool,
}

fn required_size(size: &str) -> std::result::Result<Size, ShopError> {
    Size::parse(size).map_err(|e| ShopError::Validation(e.to_string()))
}

/// Create a product with its stock.
#[instrument(skip(state))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiJson(form): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductDetailResponse>)> {
    let input = form.into_input()?;
    let detail = CatalogService::new(state.pool())
        .create_product(input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductDetailResponse::from(&detail)),
    ))
}

/// Delete a product. Past order items keep their snapshot.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    CatalogService::new(state.pool()).delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the on-hand count of a level.
#[instrument(skip(state))]
pub async fn restock(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<RestockRequest>,
) -> Result<Json<ProductDetailResponse>> {
    let size = parse_size(form.size.as_deref())?;
    let detail = CatalogService::new(state.pool())
        .restock(id, size.as_ref(), form.on_hand)
        .await?;
    Ok(Json(ProductDetailResponse::from(&detail)))
}

/// Add a size level.
#[instrument(skip(state))]
pub async fn add_size(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<SizeStockRequest>,
) -> Result<(StatusCode, Json<ProductDetailResponse>)> {
    let size = required_size(&form.size)?;
    let detail = CatalogService::new(state.pool())
        .add_size(id, size, form.on_hand)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductDetailResponse::from(&detail)),
    ))
}

/// Enable or disable a size level.
#[instrument(skip(state))]
pub async fn set_size_enabled(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath((id, size)): ApiPath<(ProductId, String)>,
    ApiJson(form): ApiJson<SizeEnabledRequest>,
) -> Result<Json<ProductDetailResponse>> {
    let size = required_size(&size)?;
    let detail = CatalogService::new(state.pool())
        .set_size_enabled(id, &size, form.enabled)
        .await?;
    Ok(Json(ProductDetailResponse::from(&detail)))
}

/// Delete a size level.
#[instrument(skip(state))]
pub async fn remove_size(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath((id, size)): ApiPath<(ProductId, String)>,
) -> Result<Json<ProductDetailResponse>> {
    let size = required_size(&size)?;
    let detail = CatalogService::new(state.pool())
        .remove_size(id, &size)
        .await?;
    Ok(Json(ProductDetailResponse::from(&detail)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(value: serde_json::Value) -> CreateProductRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sized_product_input() {
        let input = request(serde_json::json!({
            "name": "Street Deck",
            "price": "59.99",
            "category": "Boards",
            "sizes": [{"size": "8.0", "on_hand": 4}, {"size": "8.25", "on_hand": 2}],
        }))
        .into_input()
        .unwrap();

        assert!(matches!(input.stock, InitialStock::Sized(ref s) if s.len() == 2));
        assert_eq!(input.price, Money::from_cents(5999));
    }

    #[test]
    fn test_flat_stock_defaults_to_zero() {
        let input = request(serde_json::json!({"name": "Wax", "price": "4.50"}))
            .into_input()
            .unwrap();
        assert!(matches!(input.stock, InitialStock::Flat(0)));
        assert_eq!(input.category, None);
    }

    #[test]
    fn test_stock_and_sizes_rejected() {
        let result = request(serde_json::json!({
            "name": "Deck",
            "price": "10",
            "stock": 3,
            "sizes": [{"size": "8.0", "on_hand": 1}],
        }))
        .into_input();
        assert!(matches!(result, Err(ShopError::Validation(_))));
    }
}
