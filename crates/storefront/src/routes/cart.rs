//! Cart route handlers.
//!
//! Guests address their cart with a client-generated `cart_code`; a caller
//! with a bearer token and no code gets their own user cart.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use skateparadise_core::{CartCode, CartId, CartItemId, Money, ProductId, Quantity, Size};

use super::products::ProductResponse;
use super::{ApiJson, ApiQuery};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::{CartItem, CartLine, CartView};
use crate::services::ShopError;
use crate::services::cart::{CartIdentity, CartService, QuantityChange};
use crate::state::AppState;

// =============================================================================
// Responses
// =============================================================================

/// A cart line with its product.
#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub id: CartItemId,
    pub product: ProductResponse,
    pub size: Option<Size>,
    pub quantity: Quantity,
    pub total: Money,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id,
            product: ProductResponse::from(&line.product),
            size: line.item.size.clone(),
            quantity: line.item.quantity,
            total: line.total(),
        }
    }
}

/// A cart with totals.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub cart_code: CartCode,
    pub paid: bool,
    pub items: Vec<CartLineResponse>,
    pub sum_total: Money,
    pub num_of_items: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<&CartView> for CartResponse {
    fn from(view: &CartView) -> Self {
        Self {
            id: view.cart.id,
            cart_code: view.cart.cart_code.clone(),
            paid: view.cart.paid,
            items: view.lines.iter().map(CartLineResponse::from).collect(),
            sum_total: view.sum_total(),
            num_of_items: view.num_of_items(),
            created_at: view.cart.created_at,
            modified_at: view.cart.modified_at,
        }
    }
}

/// A cart line without its product, as returned by mutations.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub size: Option<Size>,
    pub quantity: Quantity,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            size: item.size.clone(),
            quantity: item.quantity,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Cart selection by query string.
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub cart_code: Option<String>,
}

/// Product lookup query.
#[derive(Debug, Deserialize)]
pub struct ProductInCartQuery {
    pub cart_code: Option<String>,
    pub product_id: ProductId,
    pub size: Option<String>,
}

/// Add to cart form.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub cart_code: Option<String>,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: Option<i64>,
}

/// Quantity change: exactly one of `quantity` (absolute) or `delta`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub cart_code: Option<String>,
    pub item_id: CartItemId,
    pub quantity: Option<i64>,
    pub delta: Option<i64>,
}

/// Remove from cart form.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub cart_code: Option<String>,
    pub item_id: CartItemId,
}

pub(crate) fn parse_size(size: Option<&str>) -> std::result::Result<Option<Size>, ShopError> {
    Size::parse_optional(size).map_err(|e| ShopError::Validation(e.to_string()))
}

fn parse_quantity(quantity: i64) -> std::result::Result<Quantity, ShopError> {
    Quantity::new(quantity).map_err(|e| ShopError::Validation(e.to_string()))
}

impl UpdateQuantityRequest {
    fn change(&self) -> std::result::Result<QuantityChange, ShopError> {
        match (self.quantity, self.delta) {
            (Some(quantity), None) => Ok(QuantityChange::Set(parse_quantity(quantity)?)),
            (None, Some(delta)) => Ok(QuantityChange::Delta(delta)),
            _ => Err(ShopError::Validation(
                "send exactly one of quantity or delta".to_owned(),
            )),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Whether a product (in a size, if given) is in the cart.
#[instrument(skip(state))]
pub async fn product_in_cart(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiQuery(query): ApiQuery<ProductInCartQuery>,
) -> Result<Json<Value>> {
    let identity = CartIdentity::resolve(query.cart_code.as_deref(), user.as_ref())?;
    let size = parse_size(query.size.as_deref())?;

    let found = CartService::new(state.pool())
        .product_in_cart(&identity, query.product_id, size.as_ref())
        .await?;
    Ok(Json(json!({ "product_in_cart": found })))
}

/// Add units of a product to the cart.
#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(form): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let identity = CartIdentity::resolve(form.cart_code.as_deref(), user.as_ref())?;
    let size = parse_size(form.size.as_deref())?;
    let quantity = parse_quantity(form.quantity.unwrap_or(1))?;

    let (cart, item) = CartService::new(state.pool())
        .add_item(&identity, form.product_id, size.as_ref(), quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", &form.product_id.to_string())]),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Item added to cart",
            "cart_code": cart.cart_code,
            "item": CartItemResponse::from(&item),
        })),
    ))
}

/// The full cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<CartResponse>> {
    let identity = CartIdentity::resolve(query.cart_code.as_deref(), user.as_ref())?;
    let view = CartService::new(state.pool()).get_cart(&identity).await?;
    Ok(Json(CartResponse::from(&view)))
}

/// Item count of the cart, zero when there is none.
#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<Value>> {
    let identity = CartIdentity::resolve(query.cart_code.as_deref(), user.as_ref())?;
    let count = CartService::new(state.pool()).item_count(&identity).await?;
    Ok(Json(json!({ "num_of_items": count })))
}

/// Change the quantity of a cart line.
#[instrument(skip(state))]
pub async fn update_quantity(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(form): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<Value>> {
    let identity = CartIdentity::resolve(form.cart_code.as_deref(), user.as_ref())?;
    let change = form.change()?;

    let item = CartService::new(state.pool())
        .update_quantity(&identity, form.item_id, change)
        .await?;

    Ok(Json(json!({
        "message": "Cart item updated",
        "item": CartItemResponse::from(&item),
    })))
}

/// Delete a cart line.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(form): ApiJson<RemoveItemRequest>,
) -> Result<Json<Value>> {
    let identity = CartIdentity::resolve(form.cart_code.as_deref(), user.as_ref())?;
    CartService::new(state.pool())
        .remove_item(&identity, form.item_id)
        .await?;

    add_breadcrumb("cart", "Removed item", None);
    Ok(Json(json!({ "message": "Cart item removed" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn update(quantity: Option<i64>, delta: Option<i64>) -> UpdateQuantityRequest {
        UpdateQuantityRequest {
            cart_code: None,
            item_id: CartItemId::new(1),
            quantity,
            delta,
        }
    }

    #[test]
    fn test_quantity_change_variants() {
        assert!(matches!(
            update(Some(3), None).change().unwrap(),
            QuantityChange::Set(q) if q.get() == 3
        ));
        assert!(matches!(
            update(None, Some(-2)).change().unwrap(),
            QuantityChange::Delta(-2)
        ));
    }

    #[test]
    fn test_quantity_change_needs_exactly_one() {
        assert!(update(None, None).change().is_err());
        assert!(update(Some(1), Some(1)).change().is_err());
        assert!(update(Some(0), None).change().is_err());
    }

    #[test]
    fn test_parse_size_blank_is_none() {
        assert_eq!(parse_size(Some("")).unwrap(), None);
        assert_eq!(parse_size(Some("8.25")).unwrap().unwrap().as_str(), "8.25");
    }
}
