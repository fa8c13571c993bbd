//! Authentication extractors.
//!
//! Callers authenticate with `Authorization: Bearer <access token>`. A header
//! that is present but invalid is rejected with 401 on every route, including
//! those where authentication is optional.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::{TokenError, TokenType};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug)]
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires an authenticated staff user.
#[derive(Debug)]
pub struct RequireStaff(pub CurrentUser);

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject requests without a token.
#[derive(Debug)]
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Error returned when a request cannot be authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No bearer token was sent.
    Missing,
    /// The `Authorization` header is not a bearer token.
    Malformed,
    /// The token failed verification.
    Invalid(TokenError),
    /// The user is not staff.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let err = match self {
            Self::Missing => AppError::Unauthorized("Authentication required".to_owned()),
            Self::Malformed => {
                AppError::Unauthorized("Authorization header must be a bearer token".to_owned())
            }
            Self::Invalid(TokenError::Expired) => {
                AppError::Unauthorized("Token has expired".to_owned())
            }
            Self::Invalid(_) => AppError::Unauthorized("Invalid token".to_owned()),
            Self::Forbidden => AppError::Forbidden("Staff access required".to_owned()),
        };
        err.into_response()
    }
}

/// Verify the bearer token of a request, if one was sent.
fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AuthRejection> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthRejection::Malformed)?;

    let claims = state
        .tokens()
        .verify(token, TokenType::Access)
        .map_err(AuthRejection::Invalid)?;
    let user = claims.current_user();

    set_sentry_user(&user.id, Some(&user.username));
    tracing::Span::current().record("user_id", tracing::field::display(user.id));
    Ok(Some(user))
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)?
            .map(Self)
            .ok_or(AuthRejection::Missing)
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?.ok_or(AuthRejection::Missing)?;
        if !user.is_staff {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}
