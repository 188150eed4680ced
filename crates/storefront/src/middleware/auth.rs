//! Bearer token authentication extractors.
//!
//! Protected routes take a [`RequireAuth`] argument. The extractor reads the
//! `Authorization: Bearer <token>` header and verifies the token against the
//! application's [`TokenIssuer`](crate::services::TokenIssuer).

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use qkart_core::Username;

use crate::error::{AppError, set_sentry_user};
use crate::services::AuthService;
use crate::state::AppState;

/// The account a request is acting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Username taken from the verified token.
    pub username: Username,
}

/// Extractor that requires a valid bearer token.
///
/// Missing or invalid tokens are rejected with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedUser);

const MISSING_TOKEN: &str = "Protected route, Oauth2 Bearer token not found";

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.to_owned()))?;

        let username = AuthService::new(state.store(), state.tokens())
            .authenticate(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                AppError::Unauthorized("Invalid or expired token".to_owned())
            })?;

        tracing::Span::current().record("username", username.as_str());
        set_sentry_user(&username);

        Ok(Self(AuthenticatedUser { username }))
    }
}

/// The token from an `Authorization: Bearer` header, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/cart");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
