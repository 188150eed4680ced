//! Cart and checkout service.

use thiserror::Error;
use tracing::instrument;

use qkart_core::{AddressId, CartEntry, ProductId, Username};

use crate::db::{RepositoryError, Store};
use crate::models::{CheckoutError, OrderReceipt};

/// Largest quantity accepted for one cart line.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the catalog.
    #[error("Product doesn't exist")]
    UnknownProduct(ProductId),

    /// Quantity above [`MAX_LINE_QUANTITY`].
    #[error("Quantity must be at most {max}")]
    QuantityTooLarge {
        /// Largest accepted quantity.
        max: u32,
    },

    /// Checkout failed; the cart and balance are unchanged.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart operations for one store.
pub struct CartService<'a> {
    store: &'a Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The user's cart entries.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the cart cannot be read.
    pub async fn entries(&self, username: &Username) -> Result<Vec<CartEntry>, CartError> {
        Ok(self.store.cart(username).await?)
    }

    /// Set the quantity of a product and return the full cart.
    ///
    /// A quantity of zero removes the line; that is allowed even for products
    /// no longer in the catalog so stale lines can be cleared.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if a non-zero quantity names a
    /// product that is not in the catalog.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn set_quantity(
        &self,
        username: &Username,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, CartError> {
        if qty > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        if qty > 0 && self.store.get_product(product_id).await?.is_none() {
            return Err(CartError::UnknownProduct(product_id.clone()));
        }

        let cart = self
            .store
            .set_cart_quantity(username, product_id, qty)
            .await?;
        tracing::debug!(lines = cart.len(), "cart updated");
        Ok(cart)
    }

    /// Place an order for the whole cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Checkout` if validation or storage fails.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn checkout(
        &self,
        username: &Username,
        address_id: &AddressId,
    ) -> Result<OrderReceipt, CartError> {
        let receipt = self.store.checkout(username, address_id).await?;
        tracing::info!(
            order_id = %receipt.order_id,
            total = %receipt.total,
            "order placed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use qkart_core::Money;

    async fn fixtures() -> (Store, Username) {
        let store = Store::from(MemoryStore::with_bundled_catalog().unwrap());
        let user = Username::parse("crio.do").unwrap();
        store
            .create_user(&user, "$argon2id$stub", Money::from_major(5000).unwrap())
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let (store, user) = fixtures().await;
        let err = CartService::new(&store)
            .set_quantity(&user, &ProductId::new("nope"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UnknownProduct(_)));
        assert_eq!(err.to_string(), "Product doesn't exist");
    }

    #[tokio::test]
    async fn test_stale_line_can_be_removed() {
        let (store, user) = fixtures().await;
        let cart = CartService::new(&store)
            .set_quantity(&user, &ProductId::new("nope"), 0)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_quantity_cap() {
        let (store, user) = fixtures().await;
        let err = CartService::new(&store)
            .set_quantity(&user, &ProductId::new("TwMM4OAhmK0VQ93S"), MAX_LINE_QUANTITY + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::QuantityTooLarge { .. }));
    }
}
