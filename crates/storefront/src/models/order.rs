//! Checkout planning.
//!
//! Every store backend loads the same inputs (balance, cart, catalog, address
//! book) inside its own atomic section, then calls [`plan_checkout`] to decide
//! whether the order may be committed and for how much.

use serde::Serialize;
use thiserror::Error;

use qkart_core::{
    Address, AddressBook, AddressId, CartEntry, Money, OrderDraft, OrderId, Product,
    ValidationFailure, reconcile, validate_order,
};

use crate::db::RepositoryError;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The authenticated account no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// The order failed validation; nothing was changed.
    #[error("order rejected: {0}")]
    Rejected(#[from] ValidationFailure),

    /// Storage failure; nothing was changed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Confirmation returned after a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// New order id.
    pub order_id: OrderId,
    /// Amount debited.
    pub total: Money,
    /// Wallet balance after the debit.
    pub balance: Money,
}

/// A validated order together with the balance it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    /// The validated order.
    pub draft: OrderDraft,
    /// Balance after debiting the subtotal.
    pub remaining: Money,
}

/// Decide whether an order may be placed.
///
/// The cart is reconciled against the catalog, so entries for products that
/// have since been removed are neither charged nor counted.
///
/// # Errors
///
/// Returns the first [`ValidationFailure`] in checkout precedence order.
pub fn plan_checkout(
    balance: Money,
    entries: &[CartEntry],
    catalog: &[Product],
    addresses: Vec<Address>,
    address_id: &AddressId,
) -> Result<CheckoutPlan, ValidationFailure> {
    let items = reconcile(entries, catalog);
    let book = AddressBook::with_selection(addresses, Some(address_id.clone()));
    let draft = validate_order(balance, &items, &book)?;

    // validate_order guarantees balance >= subtotal
    let remaining = balance
        .checked_sub(draft.subtotal)
        .ok_or(ValidationFailure::InsufficientBalance)?;

    Ok(CheckoutPlan { draft, remaining })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use qkart_core::{ProductId, Rating};

    fn catalog() -> Vec<Product> {
        vec![Product {
            id: ProductId::new("p1"),
            name: "UNIFACTOR Mens Running Shoes".to_string(),
            category: "Fashion".to_string(),
            cost: Money::from_major(50).unwrap(),
            rating: Rating::new(5).unwrap(),
            image: String::new(),
        }]
    }

    fn addresses() -> Vec<Address> {
        vec![Address::new("a1", "12 MG Road, Bengaluru, Karnataka 560001")]
    }

    #[test]
    fn test_plan_debits_subtotal() {
        let plan = plan_checkout(
            Money::from_major(500).unwrap(),
            &[CartEntry::new("p1", 2)],
            &catalog(),
            addresses(),
            &AddressId::new("a1"),
        )
        .unwrap();

        assert_eq!(plan.draft.subtotal, Money::from_major(100).unwrap());
        assert_eq!(plan.remaining, Money::from_major(400).unwrap());
    }

    #[test]
    fn test_plan_ignores_removed_products() {
        let err = plan_checkout(
            Money::from_major(500).unwrap(),
            &[CartEntry::new("discontinued", 1)],
            &catalog(),
            addresses(),
            &AddressId::new("a1"),
        )
        .unwrap_err();
        assert_eq!(err, ValidationFailure::EmptyCart);
    }

    #[test]
    fn test_plan_rejects_empty_address_id() {
        let err = plan_checkout(
            Money::from_major(500).unwrap(),
            &[CartEntry::new("p1", 1)],
            &catalog(),
            addresses(),
            &AddressId::new(""),
        )
        .unwrap_err();
        assert_eq!(err, ValidationFailure::NoAddressSelected);
    }

    #[test]
    fn test_plan_rejects_foreign_address() {
        let err = plan_checkout(
            Money::from_major(500).unwrap(),
            &[CartEntry::new("p1", 1)],
            &catalog(),
            addresses(),
            &AddressId::new("someone-elses"),
        )
        .unwrap_err();
        assert_eq!(err, ValidationFailure::UnknownAddress);
    }
}
