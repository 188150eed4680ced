//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//! GET    /health/ready                - Readiness check (store reachable)
//!
//! # Auth (base path /api/v1)
//! POST   /auth/register               - Create account
//! POST   /auth/login                  - Issue bearer token
//!
//! # Catalog
//! GET    /products                    - All products
//! GET    /products/search?value=      - Name/category search
//! GET    /products/{id}               - Single product
//!
//! # Cart (requires auth)
//! GET    /cart                        - Cart entries
//! POST   /cart                        - Set quantity (0 removes)
//! POST   /cart/checkout               - Place order
//!
//! # User (requires auth)
//! GET    /user/addresses              - Saved addresses
//! POST   /user/addresses              - Save address
//! DELETE /user/addresses/{id}         - Delete address
//! GET    /user/balance                - Wallet balance
//! ```

pub mod auth;
pub mod cart;
pub mod products;
pub mod user;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Base path of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// JSON request body whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::update))
        .route("/checkout", post(cart::checkout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(user::list_addresses).post(user::add_address),
        )
        .route("/addresses/{id}", delete(user::delete_address))
        .route("/balance", get(user::balance))
}

/// Create all versioned API routes, to be nested under [`API_PREFIX`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/user", user_routes())
}
