//! Typed client for the storefront REST API.
//!
//! One method per endpoint. Responses are mapped onto [`ClientError`]:
//! 401 becomes `Unauthorized`, other 4xx become `Rejected` with the body's
//! message, 5xx become `ServerFault`, and anything that fails below HTTP or
//! cannot be decoded becomes `Transport`.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use qkart_core::{Address, AddressId, CartEntry, Money, OrderId, Product, ProductId, Username};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// Confirmation of a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// Id of the stored order.
    pub order_id: OrderId,
    /// Amount debited from the wallet.
    pub total: Money,
    /// Wallet balance after the debit.
    pub balance: Money,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    success: bool,
}

#[derive(Deserialize)]
struct LoginResponse {
    success: bool,
    token: String,
    username: Username,
    balance: Money,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartUpdate<'a> {
    product_id: &'a ProductId,
    qty: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody<'a> {
    address_id: &'a AddressId,
}

#[derive(Serialize)]
struct NewAddress<'a> {
    address: &'a str,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Money,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    success: bool,
    #[serde(flatten)]
    confirmation: OrderConfirmation,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the storefront API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client. Every request uses `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner { http, config }),
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the username is taken or invalid.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "auth/register", None)?
            .json(&Credentials { username, password });
        let body: RegisterResponse = self.execute(request).await?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::Transport("registration was not confirmed".to_owned()))
        }
    }

    /// Log in and start a session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` for an unknown user or wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, "auth/login", None)?
            .json(&Credentials { username, password });
        let body: LoginResponse = self.execute(request).await?;
        if !body.success {
            return Err(ClientError::Transport("login was not confirmed".to_owned()));
        }
        Ok(Session::new(
            SecretString::from(body.token),
            body.username,
            body.balance,
        ))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// The whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let request = self.request(Method::GET, "products", None)?;
        self.execute(request).await
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` with status 404 if it does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ClientError> {
        let url = self.url_with_id("products", id.as_str())?;
        let request = self.inner.http.get(url);
        self.execute(request).await
    }

    /// Products whose name or category contains `text`.
    ///
    /// No match (404) is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` for any other failure.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Result<Vec<Product>, ClientError> {
        let mut url = self.inner.config.endpoint("products/search")?;
        url.query_pairs_mut().append_pair("value", text);

        match self.execute(self.inner.http.get(url)).await {
            Err(ClientError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(Vec::new())
            }
            other => other,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The session's cart entries.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the token was refused.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn cart(&self, session: &Session) -> Result<Vec<CartEntry>, ClientError> {
        let request = self.request(Method::GET, "cart", Some(session))?;
        self.execute(request).await
    }

    /// Set a product's quantity; the service returns the full cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` for an unknown product.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn set_cart_quantity(
        &self,
        session: &Session,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, ClientError> {
        let request = self
            .request(Method::POST, "cart", Some(session))?
            .json(&CartUpdate { product_id, qty });
        self.execute(request).await
    }

    /// Place an order for the whole cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` with the service's message if the
    /// order was refused.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn checkout(
        &self,
        session: &Session,
        address_id: &AddressId,
    ) -> Result<OrderConfirmation, ClientError> {
        let request = self
            .request(Method::POST, "cart/checkout", Some(session))?
            .json(&CheckoutBody { address_id });
        let body: CheckoutResponse = self.execute(request).await?;
        if body.success {
            Ok(body.confirmation)
        } else {
            Err(ClientError::Transport("order was not confirmed".to_owned()))
        }
    }

    // =========================================================================
    // User
    // =========================================================================

    /// Saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the token was refused.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn addresses(&self, session: &Session) -> Result<Vec<Address>, ClientError> {
        let request = self.request(Method::GET, "user/addresses", Some(session))?;
        self.execute(request).await
    }

    /// Save an address; the service returns the full list.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the text is too short or long.
    #[instrument(skip(self, session, text), fields(username = %session.username()))]
    pub async fn add_address(
        &self,
        session: &Session,
        text: &str,
    ) -> Result<Vec<Address>, ClientError> {
        let request = self
            .request(Method::POST, "user/addresses", Some(session))?
            .json(&NewAddress { address: text });
        self.execute(request).await
    }

    /// Delete an address; the service returns what remains.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` with status 404 if it is not saved.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn delete_address(
        &self,
        session: &Session,
        id: &AddressId,
    ) -> Result<Vec<Address>, ClientError> {
        let url = self.url_with_id("user/addresses", id.as_str())?;
        let request = self
            .inner
            .http
            .delete(url)
            .bearer_auth(session.token());
        self.execute(request).await
    }

    /// The authoritative wallet balance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the token was refused.
    #[instrument(skip(self, session), fields(username = %session.username()))]
    pub async fn balance(&self, session: &Session) -> Result<Money, ClientError> {
        let request = self.request(Method::GET, "user/balance", Some(session))?;
        let body: BalanceResponse = self.execute(request).await?;
        Ok(body.balance)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.inner.config.endpoint(path)?;
        let request = self.inner.http.request(method, url);
        Ok(match session {
            Some(session) => request.bearer_auth(session.token()),
            None => request,
        })
    }

    fn url_with_id(&self, path: &str, id: &str) -> Result<Url, ClientError> {
        let mut url = self.inner.config.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Transport("base URL cannot hold a path".to_owned()))?
            .push(id);
        Ok(url)
    }

    /// Send a request and decode a JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized(error_message(status, &text)));
        }
        if status.is_client_error() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "storefront returned a server error"
            );
            return Err(ClientError::ServerFault {
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to decode storefront response"
            );
            ClientError::Transport(format!("invalid response body: {e}"))
        })
    }
}

/// The `message` of a JSON error body, or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_owned()
        },
        |b| b.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_body() {
        let body = r#"{"success":false,"message":"Username already exists"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Username already exists"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, "<html>"), "Not Found");
    }
}
