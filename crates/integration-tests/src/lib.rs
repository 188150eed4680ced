//! Integration tests for QKart.
//!
//! Each test starts its own storefront on an ephemeral port, backed by a
//! fresh in-memory store with the bundled catalog, and drives it over HTTP
//! with `qkart-client`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use tokio::task::JoinHandle;

use qkart_client::{ClientConfig, LoginForm, RegisterForm, Storefront};
use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::db::MemoryStore;
use qkart_storefront::state::AppState;

/// Secret used by every test server.
pub const TEST_TOKEN_SECRET: &str = "integration-secret-4f9a-b2c7-e81d-0a63-59fe";

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "learnbydoing";

/// A storefront running on a local ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot start.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Start a server after adjusting its configuration.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog is invalid or no port can be bound.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let mut config = StorefrontConfig::new(SecretString::from(TEST_TOKEN_SECRET));
        configure(&mut config);

        let store = MemoryStore::with_bundled_catalog().expect("bundled catalog");
        let app = qkart_storefront::app(AppState::new(config, store.into()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self { addr, handle }
    }

    /// Root URL of the server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Client configuration pointed at this server.
    ///
    /// # Panics
    ///
    /// Panics if the URL does not parse.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::parse(&self.base_url())
            .expect("valid base url")
            .with_timeout(Duration::from_secs(5))
            .with_search_debounce(Duration::from_millis(50))
    }

    /// A client-side storefront for this server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::new(self.client_config()).expect("client")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Register `username` and log in, returning a storefront with its catalog
/// loaded.
///
/// # Panics
///
/// Panics if any step fails.
pub async fn logged_in(server: &TestServer, username: &str) -> Storefront {
    let shop = server.storefront();
    shop.register(&RegisterForm {
        username: username.to_owned(),
        password: TEST_PASSWORD.to_owned(),
        confirm_password: TEST_PASSWORD.to_owned(),
    })
    .await
    .expect("register");
    shop.login(&LoginForm {
        username: username.to_owned(),
        password: TEST_PASSWORD.to_owned(),
    })
    .await
    .expect("login");
    shop.load_catalog().await.expect("catalog");
    shop
}
