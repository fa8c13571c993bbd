//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Database reachability
//!
//! # Catalog
//! GET  /products                        - Product listing (?category=, ?search=)
//! GET  /products/search                 - Search by name or description
//! GET  /products/{category}             - Listing for one category
//! GET  /product/{id}                    - Product detail with sizes
//! GET  /product/slug/{slug}             - Product detail by slug
//!
//! # Cart (guest carts by ?cart_code, user carts by bearer token)
//! GET  /product_in_cart                 - Whether a product is in the cart
//! POST /add_item                        - Add units of a product
//! GET  /get_cart                        - Full cart with totals
//! GET  /get_cart_stat                   - Item count
//! POST /update_quantity                 - Set or offset a line quantity
//! POST /remove_item                     - Delete a line
//!
//! # Orders
//! POST /create_order                    - Checkout the open cart
//! GET  /order/{id}                      - Order detail
//! POST /order/{id}/status               - Advance status (staff)
//! GET  /order/tracking/{tracking_code}  - Order by tracking code
//! POST /order/{id}/update_client_info   - Overwrite delivery fields
//!
//! # Accounts
//! POST /register                        - Create an account
//! POST /token                           - Obtain access and refresh tokens
//! POST /token/refresh                   - New access token
//! GET  /profile   PATCH /profile        - Own profile (auth)
//! GET  /get_username                    - Own username (auth)
//! GET  /user/orders                     - Own orders (auth)
//! POST /associate_cart_to_user          - Claim a guest cart (auth)
//! POST /associate_user_to_order         - Claim an order (auth)
//!
//! # Favorites
//! GET  /favorites    POST /favorites    - List or add (?session_code)
//! DELETE /favorites/{product_id}        - Remove
//!
//! # Contact
//! POST /contact                         - Store a message
//!
//! # Catalog maintenance (staff)
//! POST   /admin/products
//! DELETE /admin/products/{id}
//! POST   /admin/products/{id}/stock
//! POST   /admin/products/{id}/sizes
//! PATCH  /admin/products/{id}/sizes/{size}
//! DELETE /admin/products/{id}/sizes/{size}
//! ```
//!
//! Trailing slashes are trimmed before routing, so `/products/` and
//! `/products` are the same route.

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod contact;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, patch, post},
};

use crate::error::AppError;
use crate::middleware::{cart_rate_limiter, strict_rate_limiter};
use crate::state::AppState;

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/search", get(products::search))
        .route("/products/{category}", get(products::by_category))
        .route("/product/{id}", get(products::show))
        .route("/product/slug/{slug}", get(products::show_by_slug))
}

/// Create the cart and checkout routes router.
///
/// Mutations share a relaxed per-IP rate limit.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add_item", post(cart::add_item))
        .route("/update_quantity", post(cart::update_quantity))
        .route("/remove_item", post(cart::remove_item))
        .route("/create_order", post(orders::create))
        .route_layer(cart_rate_limiter());

    Router::new()
        .route("/product_in_cart", get(cart::product_in_cart))
        .route("/get_cart", get(cart::show))
        .route("/get_cart_stat", get(cart::stats))
        .merge(mutations)
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order/{id}", get(orders::show))
        .route("/order/{id}/status", post(orders::update_status))
        .route(
            "/order/tracking/{tracking_code}",
            get(orders::show_by_tracking_code),
        )
        .route(
            "/order/{id}/update_client_info",
            post(orders::update_client_info),
        )
}

/// Create the account routes router.
///
/// Registration and login are strictly rate limited per IP.
pub fn account_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::obtain_token))
        .route_layer(strict_rate_limiter());

    Router::new()
        .route("/token/refresh", post(auth::refresh))
        .route(
            "/profile",
            get(account::profile).patch(account::update_profile),
        )
        .route("/get_username", get(account::username))
        .route("/user/orders", get(account::orders))
        .route("/associate_cart_to_user", post(account::claim_cart))
        .route("/associate_user_to_order", post(account::claim_order))
        .merge(credentials)
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(favorites::index).post(favorites::add))
        .route("/favorites/{product_id}", delete(favorites::remove))
}

/// Create the contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route_layer(strict_rate_limiter())
}

/// Create the catalog maintenance routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route("/products/{id}", delete(admin::delete_product))
        .route("/products/{id}/stock", post(admin::restock))
        .route("/products/{id}/sizes", post(admin::add_size))
        .route(
            "/products/{id}/sizes/{size}",
            patch(admin::set_size_enabled).delete(admin::remove_size),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(product_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(account_routes())
        .merge(favorite_routes())
        .merge(contact_routes())
        .nest("/admin", admin_routes())
}
