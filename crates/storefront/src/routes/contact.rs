//! Contact form route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::ApiJson;
use crate::error::Result;
use crate::services::contact;
use crate::state::AppState;

/// Contact form.
#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Store a contact message.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContactRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let stored = contact::submit(
        state.pool(),
        &form.name,
        &form.email,
        &form.subject,
        &form.message,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent", "id": stored.id })),
    ))
}
