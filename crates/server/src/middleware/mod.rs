//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (`x-request-id` in the span, Sentry scope and response)
//! 4. Security headers
//! 5. CORS (only when origins are configured)
//! 6. Rate limiting on auth and public order routes (governor)
//!
//! Authentication is an extractor, not a layer: handlers that take
//! [`RequireOwner`] reject requests without a valid bearer token.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireOwner;
pub use rate_limit::{ClientIpKeyExtractor, auth_rate_limiter, order_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
