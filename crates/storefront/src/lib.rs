//! QKart storefront library.
//!
//! The REST service behind the QKart shop: accounts, catalog, cart,
//! addresses and wallet checkout. Exposed as a library so the router can be
//! tested in-process and served by integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::StorefrontConfig;
use db::{CatalogError, MemoryStore, PgStore, Store};
use state::AppState;

/// Errors while opening the configured store.
#[derive(Debug, thiserror::Error)]
pub enum StoreInitError {
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Open the store selected by the configuration.
///
/// With a database URL this connects to `PostgreSQL`; migrations are not run
/// here. Otherwise an in-memory store is seeded from `catalog_path` or the
/// bundled catalog.
///
/// # Errors
///
/// Returns `StoreInitError` if the database is unreachable or the catalog
/// cannot be loaded.
pub async fn build_store(config: &StorefrontConfig) -> Result<Store, StoreInitError> {
    if let Some(url) = &config.database_url {
        let pool = db::create_pool(url).await?;
        tracing::info!("Database pool created");
        return Ok(PgStore::new(pool).into());
    }

    let memory = match &config.catalog_path {
        Some(path) => MemoryStore::new(db::load_catalog(path).await?),
        None => MemoryStore::with_bundled_catalog()?,
    };
    tracing::info!("Using in-memory store");
    Ok(memory.into())
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = state.config().cors_origin.as_deref().and_then(cors_layer);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest(routes::API_PREFIX, routes::api_routes())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                username = tracing::field::Empty,
            )
        }));

    let router = match cors {
        Some(layer) => router.layer(layer),
        None => router,
    };

    router
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid CORS origin");
            None
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
