//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (frontend origin only)
//! 5. Security headers
//! 6. Rate limiting (governor, per route group)
//!
//! Authentication is not a layer: handlers pull the caller with the
//! [`OptionalAuth`], [`RequireAuth`] and [`RequireStaff`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalAuth, RequireAuth, RequireStaff};
pub use rate_limit::{cart_rate_limiter, strict_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
