//! In-memory document store.
//!
//! All documents live behind one `RwLock`. Reads share the lock; every
//! mutation (including the whole of checkout) holds the write lock, which
//! makes each operation atomic.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use qkart_core::{Address, AddressId, CartEntry, Money, OrderId, Product, ProductId, Username};

use super::RepositoryError;
use crate::models::{CheckoutError, OrderReceipt, UserRecord, plan_checkout};

/// Catalog bundled with the binary.
const BUNDLED_CATALOG: &str = include_str!("../../data/products.json");

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),
}

/// Parse a JSON array of products, rejecting duplicate ids.
///
/// # Errors
///
/// Returns `CatalogError` if the JSON is invalid or an id repeats.
pub fn parse_catalog(json: &str) -> Result<Vec<Product>, CatalogError> {
    let products: Vec<Product> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(products.len());
    for product in &products {
        if !seen.insert(&product.id) {
            return Err(CatalogError::DuplicateId(product.id.clone()));
        }
    }
    Ok(products)
}

/// Read and parse a catalog file.
///
/// # Errors
///
/// Returns `CatalogError` if the file cannot be read or parsed.
pub async fn load_catalog(path: &Path) -> Result<Vec<Product>, CatalogError> {
    let json = tokio::fs::read_to_string(path).await?;
    parse_catalog(&json)
}

/// Process-local document store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Documents>>,
}

#[derive(Default)]
struct Documents {
    users: HashMap<Username, UserDocument>,
    products: Vec<Product>,
}

struct UserDocument {
    record: UserRecord,
    cart: Vec<CartEntry>,
    addresses: Vec<Address>,
    orders: Vec<OrderReceipt>,
}

impl MemoryStore {
    /// Create a store with the given catalog and no accounts.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Documents {
                users: HashMap::new(),
                products,
            })),
        }
    }

    /// Create a store seeded with the bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled catalog is invalid.
    pub fn with_bundled_catalog() -> Result<Self, CatalogError> {
        Ok(Self::new(parse_catalog(BUNDLED_CATALOG)?))
    }

    /// Orders placed by an account, oldest first.
    pub async fn orders(&self, username: &Username) -> Vec<OrderReceipt> {
        self.inner
            .read()
            .await
            .users
            .get(username)
            .map(|doc| doc.orders.clone())
            .unwrap_or_default()
    }

    pub(super) async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        balance: Money,
    ) -> Result<UserRecord, RepositoryError> {
        let mut docs = self.inner.write().await;
        if docs.users.contains_key(username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let record = UserRecord {
            username: username.clone(),
            password_hash: password_hash.to_owned(),
            balance,
            created_at: Utc::now(),
        };
        docs.users.insert(
            username.clone(),
            UserDocument {
                record: record.clone(),
                cart: Vec::new(),
                addresses: Vec::new(),
                orders: Vec::new(),
            },
        );
        Ok(record)
    }

    pub(super) async fn get_user(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let docs = self.inner.read().await;
        Ok(docs.users.get(username).map(|doc| doc.record.clone()))
    }

    pub(super) async fn balance(&self, username: &Username) -> Result<Money, RepositoryError> {
        let docs = self.inner.read().await;
        docs.user(username).map(|doc| doc.record.balance)
    }

    pub(super) async fn list_products(&self) -> Vec<Product> {
        self.inner.read().await.products.clone()
    }

    pub(super) async fn get_product(&self, id: &ProductId) -> Option<Product> {
        let docs = self.inner.read().await;
        docs.products.iter().find(|p| &p.id == id).cloned()
    }

    pub(super) async fn search_products(&self, query: &str) -> Vec<Product> {
        let docs = self.inner.read().await;
        docs.products
            .iter()
            .filter(|p| p.matches(query))
            .cloned()
            .collect()
    }

    pub(super) async fn upsert_products(&self, products: &[Product]) -> u64 {
        let mut docs = self.inner.write().await;
        for product in products {
            match docs.products.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => existing.clone_from(product),
                None => docs.products.push(product.clone()),
            }
        }
        products.len() as u64
    }

    pub(super) async fn cart(&self, username: &Username) -> Result<Vec<CartEntry>, RepositoryError> {
        let docs = self.inner.read().await;
        docs.user(username).map(|doc| doc.cart.clone())
    }

    pub(super) async fn set_cart_quantity(
        &self,
        username: &Username,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, RepositoryError> {
        let mut docs = self.inner.write().await;
        let doc = docs.user_mut(username)?;

        if qty == 0 {
            doc.cart.retain(|entry| &entry.product_id != product_id);
        } else if let Some(entry) = doc
            .cart
            .iter_mut()
            .find(|entry| &entry.product_id == product_id)
        {
            entry.qty = qty;
        } else {
            doc.cart.push(CartEntry::new(product_id.clone(), qty));
        }

        Ok(doc.cart.clone())
    }

    pub(super) async fn addresses(&self, username: &Username) -> Result<Vec<Address>, RepositoryError> {
        let docs = self.inner.read().await;
        docs.user(username).map(|doc| doc.addresses.clone())
    }

    pub(super) async fn add_address(
        &self,
        username: &Username,
        text: &str,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut docs = self.inner.write().await;
        let doc = docs.user_mut(username)?;
        doc.addresses.push(Address::new(AddressId::generate(), text));
        Ok(doc.addresses.clone())
    }

    pub(super) async fn delete_address(
        &self,
        username: &Username,
        id: &AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut docs = self.inner.write().await;
        let doc = docs.user_mut(username)?;
        let before = doc.addresses.len();
        doc.addresses.retain(|a| &a.id != id);
        if doc.addresses.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(doc.addresses.clone())
    }

    pub(super) async fn checkout(
        &self,
        username: &Username,
        address_id: &AddressId,
    ) -> Result<OrderReceipt, CheckoutError> {
        let mut guard = self.inner.write().await;
        let docs = &mut *guard;
        let doc = docs
            .users
            .get_mut(username)
            .ok_or(CheckoutError::UserNotFound)?;

        let plan = plan_checkout(
            doc.record.balance,
            &doc.cart,
            &docs.products,
            doc.addresses.clone(),
            address_id,
        )?;

        let receipt = OrderReceipt {
            order_id: OrderId::generate(),
            total: plan.draft.subtotal,
            balance: plan.remaining,
        };
        doc.record.balance = plan.remaining;
        doc.cart.clear();
        doc.orders.push(receipt.clone());

        Ok(receipt)
    }
}

impl Documents {
    fn user(&self, username: &Username) -> Result<&UserDocument, RepositoryError> {
        self.users.get(username).ok_or(RepositoryError::NotFound)
    }

    fn user_mut(&mut self, username: &Username) -> Result<&mut UserDocument, RepositoryError> {
        self.users.get_mut(username).ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use qkart_core::ValidationFailure;

    fn alice() -> Username {
        Username::parse("alice.k").unwrap()
    }

    async fn store_with_user(balance: i64) -> MemoryStore {
        let store = MemoryStore::with_bundled_catalog().unwrap();
        store
            .create_user(&alice(), "$argon2id$stub", Money::from_major(balance).unwrap())
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let products = parse_catalog(BUNDLED_CATALOG).unwrap();
        assert!(products.len() >= 10);
    }

    #[test]
    fn test_parse_catalog_rejects_duplicates() {
        let json = r#"[
            {"_id":"p1","name":"a","category":"c","cost":1,"rating":1,"image":""},
            {"_id":"p1","name":"b","category":"c","cost":2,"rating":2,"image":""}
        ]"#;
        assert!(matches!(
            parse_catalog(json),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = store_with_user(10).await;
        let err = store
            .create_user(&alice(), "$argon2id$other", Money::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_quantity_keeps_position_and_zero_removes() {
        let store = store_with_user(10).await;
        let user = alice();
        let a = ProductId::new("BW0jAAeDJmlZCF8i");
        let b = ProductId::new("PmInA797xJhMIPti");

        store.set_cart_quantity(&user, &a, 1).await.unwrap();
        store.set_cart_quantity(&user, &b, 2).await.unwrap();
        let cart = store.set_cart_quantity(&user, &a, 5).await.unwrap();
        assert_eq!(cart, vec![CartEntry::new(a.clone(), 5), CartEntry::new(b.clone(), 2)]);

        let cart = store.set_cart_quantity(&user, &a, 0).await.unwrap();
        assert_eq!(cart, vec![CartEntry::new(b, 2)]);
    }

    #[tokio::test]
    async fn test_delete_unknown_address_is_not_found() {
        let store = store_with_user(10).await;
        let err = store
            .delete_address(&alice(), &AddressId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_search_matches_category() {
        let store = MemoryStore::with_bundled_catalog().unwrap();
        let results = store.search_products("sports").await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|p| p.category == "Sports"));
    }

    #[tokio::test]
    async fn test_checkout_commits_atomically() {
        let store = store_with_user(5000).await;
        let user = alice();
        let shoes = ProductId::new("TwMM4OAhmK0VQ93S");
        store.set_cart_quantity(&user, &shoes, 2).await.unwrap();
        let addresses = store
            .add_address(&user, "12 MG Road, Bengaluru, Karnataka 560001")
            .await
            .unwrap();

        let receipt = store.checkout(&user, &addresses[0].id).await.unwrap();
        assert_eq!(receipt.total, Money::from_major(100).unwrap());
        assert_eq!(receipt.balance, Money::from_major(4900).unwrap());
        assert_eq!(store.balance(&user).await.unwrap(), receipt.balance);
        assert!(store.cart(&user).await.unwrap().is_empty());
        assert_eq!(store.orders(&user).await, vec![receipt]);
    }

    #[tokio::test]
    async fn test_rejected_checkout_changes_nothing() {
        let store = store_with_user(10).await;
        let user = alice();
        let ipad = ProductId::new("v4sLtEcMpzabRyf");
        store.set_cart_quantity(&user, &ipad, 1).await.unwrap();

        let err = store
            .checkout(&user, &AddressId::new("none"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Rejected(ValidationFailure::InsufficientBalance)
        ));
        assert_eq!(store.balance(&user).await.unwrap(), Money::from_major(10).unwrap());
        assert_eq!(store.cart(&user).await.unwrap().len(), 1);
        assert!(store.orders(&user).await.is_empty());
    }
}
