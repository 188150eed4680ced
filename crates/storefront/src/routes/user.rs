//! Address book and wallet routes. All require a bearer token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use qkart_core::{Address, AddressId, Money};

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::AccountService;
use crate::state::AppState;

/// Save a new address.
#[derive(Debug, Deserialize)]
pub struct AddAddressRequest {
    #[serde(default)]
    pub address: String,
}

/// Wallet balance.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Money,
}

/// Saved addresses.
///
/// GET /api/v1/user/addresses
///
/// # Errors
///
/// Returns 401 without a valid token.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(
        AccountService::new(state.store())
            .addresses(&user.username)
            .await?,
    ))
}

/// Save an address and return the full list.
///
/// POST /api/v1/user/addresses
///
/// # Errors
///
/// Returns 400 if the text is shorter than 20 or longer than 128 characters.
#[instrument(skip(state, user, body), fields(username = %user.username))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddAddressRequest>,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(
        AccountService::new(state.store())
            .add_address(&user.username, &body.address)
            .await?,
    ))
}

/// Delete an address and return what remains.
///
/// DELETE /api/v1/user/addresses/{id}
///
/// # Errors
///
/// Returns 404 if the address is not saved.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(
        AccountService::new(state.store())
            .delete_address(&user.username, &id)
            .await?,
    ))
}

/// Authoritative wallet balance.
///
/// GET /api/v1/user/balance
///
/// # Errors
///
/// Returns 401 without a valid token.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn balance(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<BalanceResponse>> {
    let balance = AccountService::new(state.store())
        .balance(&user.username)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}
