//! Account route handlers.
//!
//! Every handler here requires a valid access token.

use axum::{Json, extract::State};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use skateparadise_core::{CartCode, Email, OrderId, UserId};

use super::ApiJson;
use super::orders::OrderResponse;
use crate::db::users::ProfileUpdate;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::ShopError;
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// A user's own profile.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            state: user.state.clone(),
            city: user.city.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

/// Profile changes. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(form: ProfileRequest) -> Self {
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            state: form.state,
            city: form.city,
            address: form.address,
            phone: form.phone,
            birth_date: form.birth_date,
        }
    }
}

/// Cart claim form.
#[derive(Debug, Deserialize)]
pub struct ClaimCartRequest {
    pub cart_code: String,
}

/// Order claim form.
#[derive(Debug, Deserialize)]
pub struct ClaimOrderRequest {
    pub order_id: OrderId,
}

/// The caller's profile.
#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserResponse>> {
    let profile = AuthService::new(state.pool(), state.tokens())
        .profile(user.id)
        .await?;
    Ok(Json(UserResponse::from(&profile)))
}

/// Update the caller's profile.
#[instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<ProfileRequest>,
) -> Result<Json<UserResponse>> {
    let profile = AuthService::new(state.pool(), state.tokens())
        .update_profile(user.id, &form.into())
        .await?;
    Ok(Json(UserResponse::from(&profile)))
}

/// The caller's username, straight from the token.
#[instrument(skip_all)]
pub async fn username(RequireAuth(user): RequireAuth) -> Json<Value> {
    Json(json!({ "username": user.username }))
}

/// The caller's orders, newest first.
#[instrument(skip(state))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderService::new(state.pool()).for_user(user.id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// Attach a guest cart to the caller.
#[instrument(skip(state))]
pub async fn claim_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<ClaimCartRequest>,
) -> Result<Json<Value>> {
    let code = CartCode::parse(&form.cart_code).map_err(|_| ShopError::CartNotFound)?;
    let cart = CartService::new(state.pool()).claim(&code, &user).await?;

    Ok(Json(json!({
        "message": "Cart associated with user",
        "cart_code": cart.cart_code,
    })))
}

/// Attach an order to the caller.
#[instrument(skip(state))]
pub async fn claim_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<ClaimOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let service = OrderService::new(state.pool());
    service.claim(form.order_id, &user).await?;
    let order = service.get(form.order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_request_keeps_absent_fields_unset() {
        let form: ProfileRequest = serde_json::from_value(json!({
            "city": "Bordeaux",
            "birth_date": "1990-04-12",
        }))
        .unwrap();
        let update = ProfileUpdate::from(form);

        assert_eq!(update.city.as_deref(), Some("Bordeaux"));
        assert_eq!(
            update.birth_date,
            Some(NaiveDate::from_ymd_opt(1990, 4, 12).unwrap())
        );
        assert!(update.first_name.is_none());
        assert!(update.phone.is_none());
    }
}
