//! Client configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors building a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for talking to a storefront service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the service, e.g. `http://127.0.0.1:8082/`.
    pub base_url: Url,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Quiescence window before a typed search is sent.
    pub search_debounce: Duration,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default search debounce window.
    pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

    /// Configuration for `base_url` with default timings.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
            search_debounce: Self::DEFAULT_SEARCH_DEBOUNCE,
        }
    }

    /// Parse a base URL and use default timings.
    ///
    /// # Errors
    ///
    /// Returns `ClientConfigError::InvalidUrl` if `base_url` does not parse.
    pub fn parse(base_url: &str) -> Result<Self, ClientConfigError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    /// Load configuration from environment variables.
    ///
    /// - `QKART_API_URL` (default `http://127.0.0.1:8082/`)
    /// - `QKART_CLIENT_TIMEOUT_MS` (default 10000)
    /// - `QKART_SEARCH_DEBOUNCE_MS` (default 500)
    ///
    /// # Errors
    ///
    /// Returns `ClientConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        let _ = dotenvy::dotenv();

        let base_url = std::env::var("QKART_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8082/".to_owned());
        let mut config = Self::parse(&base_url)?;

        if let Some(ms) = millis_from_env("QKART_CLIENT_TIMEOUT_MS")? {
            config.timeout = ms;
        }
        if let Some(ms) = millis_from_env("QKART_SEARCH_DEBOUNCE_MS")? {
            config.search_debounce = ms;
        }
        Ok(config)
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the search debounce window.
    #[must_use]
    pub const fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    /// URL of an API path below `/api/v1/`.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join("api/v1/")?.join(path.trim_start_matches('/'))
    }
}

fn millis_from_env(key: &str) -> Result<Option<Duration>, ClientConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ClientConfigError::InvalidValue(key.to_owned(), e.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_under_api_prefix() {
        let config = ClientConfig::parse("http://127.0.0.1:8082").unwrap();
        assert_eq!(
            config.endpoint("products/search").unwrap().as_str(),
            "http://127.0.0.1:8082/api/v1/products/search"
        );

        let config = ClientConfig::parse("https://shop.example/qkart").unwrap();
        assert_eq!(
            config.endpoint("/cart").unwrap().as_str(),
            "https://shop.example/qkart/api/v1/cart"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::parse("http://localhost:8082/").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.search_debounce, Duration::from_millis(500));
    }
}
