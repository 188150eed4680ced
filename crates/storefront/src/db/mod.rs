//! Document store for the storefront.
//!
//! Each account owns a small document: credentials, wallet balance, cart
//! entries and saved addresses. The catalog is shared. Two backends implement
//! the same operations:
//!
//! - [`MemoryStore`] - process-local, seeded from a JSON catalog (default)
//! - [`PgStore`] - `PostgreSQL` via sqlx
//!
//! ## Tables (`PostgreSQL`)
//!
//! - `users` - credentials and balance
//! - `products` - catalog, ordered by insertion
//! - `cart_entries` - `(username, product_id, qty)`
//! - `addresses` - saved shipping addresses
//! - `orders` - committed orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p qkart-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use qkart_core::{Address, AddressId, CartEntry, Money, Product, ProductId, Username};

use crate::models::{CheckoutError, OrderReceipt, UserRecord};

pub use memory::{CatalogError, MemoryStore, load_catalog, parse_catalog};
pub use postgres::PgStore;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// The storefront's document store.
///
/// Cloning is cheap; both backends share their state.
#[derive(Clone)]
pub enum Store {
    /// In-memory backend.
    Memory(MemoryStore),
    /// `PostgreSQL` backend.
    Postgres(PgStore),
}

impl Store {
    /// Short backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not respond.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Postgres(s) => s.ping().await,
        }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account with an empty cart and address book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        balance: Money,
    ) -> Result<UserRecord, RepositoryError> {
        match self {
            Self::Memory(s) => s.create_user(username, password_hash, balance).await,
            Self::Postgres(s) => s.create_user(username, password_hash, balance).await,
        }
    }

    /// Look up an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn get_user(&self, username: &Username) -> Result<Option<UserRecord>, RepositoryError> {
        match self {
            Self::Memory(s) => s.get_user(username).await,
            Self::Postgres(s) => s.get_user(username).await,
        }
    }

    /// Current wallet balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn balance(&self, username: &Username) -> Result<Money, RepositoryError> {
        match self {
            Self::Memory(s) => s.balance(username).await,
            Self::Postgres(s) => s.balance(username).await,
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All products in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        match self {
            Self::Memory(s) => Ok(s.list_products().await),
            Self::Postgres(s) => s.list_products().await,
        }
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        match self {
            Self::Memory(s) => Ok(s.get_product(id).await),
            Self::Postgres(s) => s.get_product(id).await,
        }
    }

    /// Products whose name or category contains `query` (case-insensitive),
    /// in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        match self {
            Self::Memory(s) => Ok(s.search_products(query).await),
            Self::Postgres(s) => s.search_products(query).await,
        }
    }

    /// Insert or update catalog products, keeping the position of existing
    /// ones. Returns the number of products written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn upsert_products(&self, products: &[Product]) -> Result<u64, RepositoryError> {
        match self {
            Self::Memory(s) => Ok(s.upsert_products(products).await),
            Self::Postgres(s) => s.upsert_products(products).await,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The account's cart entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn cart(&self, username: &Username) -> Result<Vec<CartEntry>, RepositoryError> {
        match self {
            Self::Memory(s) => s.cart(username).await,
            Self::Postgres(s) => s.cart(username).await,
        }
    }

    /// Set the quantity of one product in the cart and return the full cart.
    ///
    /// `qty == 0` removes the entry. A new product is appended; an existing
    /// one keeps its position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn set_cart_quantity(
        &self,
        username: &Username,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, RepositoryError> {
        match self {
            Self::Memory(s) => s.set_cart_quantity(username, product_id, qty).await,
            Self::Postgres(s) => s.set_cart_quantity(username, product_id, qty).await,
        }
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Saved addresses in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn addresses(&self, username: &Username) -> Result<Vec<Address>, RepositoryError> {
        match self {
            Self::Memory(s) => s.addresses(username).await,
            Self::Postgres(s) => s.addresses(username).await,
        }
    }

    /// Save a new address and return the full list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn add_address(
        &self,
        username: &Username,
        text: &str,
    ) -> Result<Vec<Address>, RepositoryError> {
        match self {
            Self::Memory(s) => s.add_address(username, text).await,
            Self::Postgres(s) => s.add_address(username, text).await,
        }
    }

    /// Delete a saved address and return the remaining list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account or the address
    /// does not exist.
    pub async fn delete_address(
        &self,
        username: &Username,
        id: &AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        match self {
            Self::Memory(s) => s.delete_address(username, id).await,
            Self::Postgres(s) => s.delete_address(username, id).await,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place an order for the account's cart, shipped to `address_id`.
    ///
    /// Validation, the balance debit, clearing the cart and recording the
    /// order happen atomically: on any error nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Rejected` if the order fails validation.
    pub async fn checkout(
        &self,
        username: &Username,
        address_id: &AddressId,
    ) -> Result<OrderReceipt, CheckoutError> {
        match self {
            Self::Memory(s) => s.checkout(username, address_id).await,
            Self::Postgres(s) => s.checkout(username, address_id).await,
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<PgStore> for Store {
    fn from(store: PgStore) -> Self {
        Self::Postgres(store)
    }
}
