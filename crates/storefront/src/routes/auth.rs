//! Registration and token route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::ApiJson;
use super::account::UserResponse;
use crate::error::Result;
use crate::services::auth::{AuthService, Registration, TokenPair};
use crate::state::AppState;

/// Registration form.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login form.
#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Refresh form.
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Create an account.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let registration = Registration {
        username: &form.username,
        email: &form.email,
        password: &form.password,
        first_name: form.first_name.as_deref(),
        last_name: form.last_name.as_deref(),
    };
    let user = AuthService::new(state.pool(), state.tokens())
        .register(&registration)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange credentials for an access and a refresh token.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<TokenRequest>,
) -> Result<Json<TokenPair>> {
    let pair = AuthService::new(state.pool(), state.tokens())
        .obtain_token(&form.username, &form.password)
        .await?;
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token.
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RefreshRequest>,
) -> Result<Json<Value>> {
    let access = AuthService::new(state.pool(), state.tokens())
        .refresh(&form.refresh)
        .await?;
    Ok(Json(json!({ "access": access })))
}
