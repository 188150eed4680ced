//! Cart and checkout routes. All require a bearer token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use qkart_core::{AddressId, CartEntry, Money, OrderId, ProductId};

use super::ApiJson;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::state::AppState;

/// Set one cart line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub qty: u32,
}

/// Place an order to a saved address.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: AddressId,
}

/// Body of a committed checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub total: Money,
    pub balance: Money,
}

/// The user's cart entries.
///
/// GET /api/v1/cart
///
/// # Errors
///
/// Returns 401 without a valid token.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartEntry>>> {
    Ok(Json(
        CartService::new(state.store())
            .entries(&user.username)
            .await?,
    ))
}

/// Set the quantity of one product; zero removes it.
///
/// POST /api/v1/cart
///
/// # Errors
///
/// Returns 400 if the product does not exist.
#[instrument(skip(state, user, body), fields(username = %user.username, product_id = %body.product_id, qty = body.qty))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<UpdateCartRequest>,
) -> Result<Json<Vec<CartEntry>>> {
    let cart = CartService::new(state.store())
        .set_quantity(&user.username, &body.product_id, body.qty)
        .await?;
    Ok(Json(cart))
}

/// Pay for the cart from the wallet and empty it.
///
/// POST /api/v1/cart/checkout
///
/// # Errors
///
/// Returns 400 for an empty cart, an insufficient balance, or an address
/// that is not saved. Nothing changes on failure.
#[instrument(skip(state, user, body), fields(username = %user.username, address_id = %body.address_id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    add_breadcrumb(
        "cart",
        "Checkout started",
        Some(&[("address_id", body.address_id.as_str())]),
    );

    let receipt = CartService::new(state.store())
        .checkout(&user.username, &body.address_id)
        .await?;

    Ok(Json(CheckoutResponse {
        success: true,
        order_id: receipt.order_id,
        total: receipt.total,
        balance: receipt.balance,
    }))
}
