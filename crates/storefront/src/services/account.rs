//! Address book and wallet service.

use thiserror::Error;
use tracing::instrument;

use qkart_core::{Address, AddressId, Money, Username};

use crate::db::{RepositoryError, Store};

/// Shortest accepted address text, in characters.
pub const MIN_ADDRESS_LENGTH: usize = 20;

/// Longest accepted address text, in characters.
pub const MAX_ADDRESS_LENGTH: usize = 128;

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Address text is shorter than `min` characters after trimming.
    #[error("Address should be greater than {min} characters")]
    AddressTooShort { min: usize },

    /// Address text is longer than `max` characters after trimming.
    #[error("Address should be less than {max} characters")]
    AddressTooLong { max: usize },

    /// The user has no address with this id.
    #[error("Address to delete was not found")]
    AddressNotFound,

    /// Store operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Address book and balance operations.
pub struct AccountService<'a> {
    store: &'a Store,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn addresses(&self, username: &Username) -> Result<Vec<Address>, AccountError> {
        Ok(self.store.addresses(username).await?)
    }

    /// Save an address and return the full list.
    ///
    /// Surrounding whitespace is trimmed before the length check.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AddressTooShort` or `AddressTooLong` when the
    /// text is outside 20..=128 characters.
    #[instrument(skip(self, text), fields(username = %username))]
    pub async fn add_address(
        &self,
        username: &Username,
        text: &str,
    ) -> Result<Vec<Address>, AccountError> {
        let text = text.trim();
        let len = text.chars().count();
        if len < MIN_ADDRESS_LENGTH {
            return Err(AccountError::AddressTooShort {
                min: MIN_ADDRESS_LENGTH,
            });
        }
        if len > MAX_ADDRESS_LENGTH {
            return Err(AccountError::AddressTooLong {
                max: MAX_ADDRESS_LENGTH,
            });
        }

        Ok(self.store.add_address(username, text).await?)
    }

    /// Delete an address and return the remaining list.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AddressNotFound` if the user has no such address.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn delete_address(
        &self,
        username: &Username,
        id: &AddressId,
    ) -> Result<Vec<Address>, AccountError> {
        self.store
            .delete_address(username, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AccountError::AddressNotFound,
                other => AccountError::Repository(other),
            })
    }

    /// Authoritative wallet balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn balance(&self, username: &Username) -> Result<Money, AccountError> {
        Ok(self.store.balance(username).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn fixtures() -> (Store, Username) {
        let store = Store::from(MemoryStore::new(Vec::new()));
        let user = Username::parse("crio.do").unwrap();
        store
            .create_user(&user, "$argon2id$stub", Money::ZERO)
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_address_length_bounds() {
        let (store, user) = fixtures().await;
        let accounts = AccountService::new(&store);

        let err = accounts.add_address(&user, "too short").await.unwrap_err();
        assert_eq!(err.to_string(), "Address should be greater than 20 characters");

        let err = accounts
            .add_address(&user, &"x".repeat(129))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::AddressTooLong { max: 128 }));

        let all = accounts
            .add_address(&user, "  221B Baker Street, London NW1 6XE  ")
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "221B Baker Street, London NW1 6XE");
    }

    #[tokio::test]
    async fn test_delete_address() {
        let (store, user) = fixtures().await;
        let accounts = AccountService::new(&store);
        let all = accounts
            .add_address(&user, "742 Evergreen Terrace, Springfield")
            .await
            .unwrap();

        let remaining = accounts.delete_address(&user, &all[0].id).await.unwrap();
        assert!(remaining.is_empty());

        let err = accounts.delete_address(&user, &all[0].id).await.unwrap_err();
        assert!(matches!(err, AccountError::AddressNotFound));
    }
}
