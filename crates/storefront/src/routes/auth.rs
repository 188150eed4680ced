//! Registration and login routes.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use qkart_core::{Money, Username};

use super::ApiJson;
use crate::error::Result;
use crate::services::AuthService;
use crate::state::AppState;

/// Credentials posted to both auth endpoints.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
}

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: Username,
    pub balance: Money,
}

/// Create an account with the configured starting balance.
///
/// POST /api/v1/auth/register
///
/// # Errors
///
/// Returns 400 if the username is taken or the credentials are invalid.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, axum::Json<RegisterResponse>)> {
    AuthService::new(state.store(), state.tokens())
        .register(&body.username, &body.password, state.config().starting_balance)
        .await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(RegisterResponse { success: true }),
    ))
}

/// Log in and receive a bearer token.
///
/// POST /api/v1/auth/login
///
/// # Errors
///
/// Returns 400 for an unknown username or a wrong password.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, axum::Json<LoginResponse>)> {
    let outcome = AuthService::new(state.store(), state.tokens())
        .login(&body.username, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(LoginResponse {
            success: true,
            token: outcome.token,
            username: outcome.username,
            balance: outcome.balance,
        }),
    ))
}
