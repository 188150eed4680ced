//! Catalog routes.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use qkart_core::{Product, ProductId};

use super::{ApiPath, ApiQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query string for product search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub value: String,
}

/// The whole catalog in display order.
///
/// GET /api/v1/products
///
/// # Errors
///
/// Returns 500 if the catalog cannot be read.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store().list_products().await?))
}

/// A single product.
///
/// GET /api/v1/products/{id}
///
/// # Errors
///
/// Returns 404 if no product has this id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    state
        .store()
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product doesn't exist".to_owned()))
}

/// Products whose name or category contains the search text.
///
/// GET /api/v1/products/search?value=<text>
///
/// Blank text returns the whole catalog.
///
/// # Errors
///
/// Returns 404 when nothing matches.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    let text = query.value.trim();
    let products = if text.is_empty() {
        state.store().list_products().await?
    } else {
        state.store().search_products(text).await?
    };

    if products.is_empty() {
        return Err(AppError::NotFound("No products found".to_owned()));
    }
    Ok(Json(products))
}
