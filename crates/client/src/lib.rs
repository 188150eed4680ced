//! QKart client library.
//!
//! A typed client for the storefront REST API plus the client-side state a
//! shop UI drives: the login session, catalog and search results, cart and
//! address book, and the checkout flow.
//!
//! # Modules
//!
//! - [`api`] - one method per endpoint, errors mapped to [`ClientError`]
//! - [`storefront`] - session and state slots, debounced search, checkout
//! - [`slot`] - ticketed state slots that drop superseded results
//! - [`search`] - the debounce timer
//! - [`forms`] - register and login form checks
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_client::{ClientConfig, LoginForm, Storefront};
//!
//! let shop = Storefront::new(ClientConfig::from_env()?)?;
//! shop.load_catalog().await?;
//! shop.login(&LoginForm { username: "crio.do".into(), password: "learnbydoing".into() }).await?;
//! shop.add_to_cart(&"TwMM4OAhmK0VQ93S".into(), 1).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod search;
pub mod session;
pub mod slot;
pub mod storefront;

pub use api::{ApiClient, OrderConfirmation};
pub use config::{ClientConfig, ClientConfigError};
pub use error::{ClientError, FormError};
pub use forms::{LoginForm, RegisterForm};
pub use search::Debouncer;
pub use session::Session;
pub use slot::{Slot, Ticket};
pub use storefront::{Storefront, StorefrontEvent};
