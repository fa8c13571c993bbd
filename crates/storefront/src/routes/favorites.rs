//! Favorites route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use skateparadise_core::{FavoriteId, ProductId};

use super::products::ProductResponse;
use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::Result;
use crate::models::Favorite;
use crate::services::favorites::{FavoriteService, parse_session_code};
use crate::state::AppState;

/// A favorite product.
#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub id: FavoriteId,
    pub product: ProductResponse,
    pub created_at: DateTime<Utc>,
}

impl From<&Favorite> for FavoriteResponse {
    fn from(favorite: &Favorite) -> Self {
        Self {
            id: favorite.id,
            product: ProductResponse::from(&favorite.product),
            created_at: favorite.created_at,
        }
    }
}

/// Session selection by query string.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_code: Option<String>,
}

/// Add favorite form.
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub session_code: Option<String>,
    pub product_id: ProductId,
}

/// Favorites of a session.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Vec<FavoriteResponse>>> {
    let session = parse_session_code(query.session_code.as_deref())?;
    let favorites = FavoriteService::new(state.pool()).list(&session).await?;
    Ok(Json(favorites.iter().map(FavoriteResponse::from).collect()))
}

/// Add a favorite. A repeat add answers 200 instead of 201.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let session = parse_session_code(form.session_code.as_deref())?;
    let added = FavoriteService::new(state.pool())
        .add(&session, form.product_id)
        .await?;

    if added {
        Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Added to favorites" })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already in favorites" })),
        ))
    }
}

/// Remove a favorite.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<StatusCode> {
    let session = parse_session_code(query.session_code.as_deref())?;
    FavoriteService::new(state.pool())
        .remove(&session, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
