//! Checkout and order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use skateparadise_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, Quantity, Size,
    TrackingCode, UserId,
};

use super::{ApiJson, ApiPath};
use crate::db::orders::ClientInfo;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireStaff};
use crate::models::{OrderItem, OrderWithItems};
use crate::services::ShopError;
use crate::services::cart::CartIdentity;
use crate::services::orders::{OrderService, parse_payment_method};
use crate::state::AppState;

/// A frozen order line.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub size: Option<Size>,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub total: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            size: item.size.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total(),
        }
    }
}

/// An order with its items.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub tracking_code: TrackingCode,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub total: Money,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OrderWithItems> for OrderResponse {
    fn from(full: &OrderWithItems) -> Self {
        let order = &full.order;
        Self {
            id: order.id,
            tracking_code: order.tracking_code.clone(),
            status: order.status,
            payment_method: order.payment_method,
            user_id: order.user_id,
            name: order.name.clone(),
            address: order.address.clone(),
            phone: order.phone.clone(),
            total: order.total,
            items: full.items.iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Delivery and payment fields. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ClientInfoRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<String>,
}

impl ClientInfoRequest {
    fn into_client_info(self) -> std::result::Result<ClientInfo, ShopError> {
        Ok(ClientInfo {
            payment_method: parse_payment_method(self.payment_method.as_deref())?,
            name: non_blank(self.name),
            address: non_blank(self.address),
            phone: non_blank(self.phone),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Checkout form.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub cart_code: Option<String>,
    #[serde(flatten)]
    pub client: ClientInfoRequest,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Turn the open cart into an order.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(form): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let identity = CartIdentity::resolve(form.cart_code.as_deref(), user.as_ref())?;
    let info = form.client.into_client_info()?;

    let order = OrderService::new(state.pool())
        .create_order(&identity, user.as_ref(), &info)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("order_id", &order.order.id.to_string())]),
    );
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// Order detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool()).get(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Order detail by tracking code.
#[instrument(skip(state))]
pub async fn show_by_tracking_code(
    State(state): State<AppState>,
    ApiPath(tracking_code): ApiPath<String>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool())
        .get_by_tracking_code(&tracking_code)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Move an order forward. Staff only.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(form): ApiJson<StatusRequest>,
) -> Result<Json<OrderResponse>> {
    let service = OrderService::new(state.pool());
    service.update_status(id, &form.status).await?;
    let order = service.get(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Overwrite delivery and payment fields, in any status.
#[instrument(skip(state))]
pub async fn update_client_info(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(form): ApiJson<ClientInfoRequest>,
) -> Result<Json<OrderResponse>> {
    let info = form.into_client_info()?;
    let service = OrderService::new(state.pool());
    service.update_client_info(id, &info).await?;
    let order = service.get(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}
