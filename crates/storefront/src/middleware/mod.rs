//! HTTP middleware for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (when an origin is configured)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! public and protected routes share one router.

pub mod auth;
pub mod request_id;

pub use auth::{AuthenticatedUser, RequireAuth};
pub use request_id::request_id_middleware;
