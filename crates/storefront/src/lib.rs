//! SkateParadise Storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested and reused. [`app`] builds the complete service, middleware
//! included; the binary only adds configuration, logging and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, Response, header},
};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::StorefrontConfig;
use crate::state::AppState;

/// Build the storefront service.
///
/// # Middleware Order (outermost first)
///
/// 1. Trailing slash normalization (`/products/` routes as `/products`)
/// 2. Sentry hub and HTTP transaction
/// 3. `TraceLayer` span with `request_id` and `user_id` fields
/// 4. Request ID
/// 5. CORS
/// 6. Security headers
pub fn app(state: AppState) -> NormalizePath<Router> {
    let media = ServeDir::new(&state.config().media_dir);
    let cors = cors_layer(state.config());

    let router = Router::new()
        .merge(routes::routes())
        .nest_service("/media", media)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// CORS for the configured frontend origin only.
fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    match HeaderValue::from_str(&config.frontend_origin()) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "Frontend origin is not a valid header; CORS disabled");
            cors
        }
    }
}
