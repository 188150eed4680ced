//! Checkout validation.
//!
//! [`can_checkout`] is the gate the order button consults. Its checks run in a
//! fixed order and the first failure wins: a user with no addresses who is
//! also underfunded sees the balance error.
//!
//! [`validate_order`] wraps it with the checks that need the line items (empty
//! cart) or the address contents (a selection that no longer exists), and
//! produces the [`OrderDraft`] the server commits.

use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::pricing::{checked_total_value, total_count};
use crate::types::{AddressBook, AddressId, Money};

/// Why an order may not be placed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationFailure {
    /// The wallet balance is below the subtotal.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// The user has no saved addresses.
    #[error("no address on file")]
    NoAddressOnFile,
    /// No shipping address is selected.
    #[error("no address selected")]
    NoAddressSelected,
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,
    /// The selected address is not in the address book.
    #[error("selected address does not exist")]
    UnknownAddress,
}

impl ValidationFailure {
    /// Text shown to the user.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InsufficientBalance => {
                "You do not have enough balance in your wallet for this purchase"
            }
            Self::NoAddressOnFile => "Please add a new address before proceeding.",
            Self::NoAddressSelected => "Please select one shipping address to proceed.",
            Self::EmptyCart => "Cart is empty",
            Self::UnknownAddress => "Address not found",
        }
    }
}

/// Decide whether checkout may proceed.
///
/// Precedence:
/// 1. `available_balance < subtotal` fails with `InsufficientBalance`;
/// 2. an empty address book fails with `NoAddressOnFile`;
/// 3. no selection fails with `NoAddressSelected`.
///
/// # Errors
///
/// Returns the first failing condition.
///
/// ```
/// use qkart_core::{AddressBook, Money, ValidationFailure, can_checkout};
///
/// let r = can_checkout(Money::from_cents(100), Money::from_cents(200), &AddressBook::default());
/// assert_eq!(r, Err(ValidationFailure::InsufficientBalance));
/// ```
pub fn can_checkout(
    available_balance: Money,
    subtotal: Money,
    addresses: &AddressBook,
) -> Result<(), ValidationFailure> {
    if available_balance < subtotal {
        return Err(ValidationFailure::InsufficientBalance);
    }
    if addresses.is_empty() {
        return Err(ValidationFailure::NoAddressOnFile);
    }
    if addresses.selected().is_none() {
        return Err(ValidationFailure::NoAddressSelected);
    }
    Ok(())
}

/// A validated order, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Shipping address.
    pub address_id: AddressId,
    /// Amount to debit.
    pub subtotal: Money,
    /// Units ordered.
    pub item_count: u64,
}

/// Validate a full order.
///
/// An empty cart (or one holding only zero-quantity lines) is rejected first.
/// The three [`can_checkout`] checks follow in their fixed order, then the
/// selected id is checked against the address book. A subtotal that overflows
/// is reported as `InsufficientBalance`.
///
/// # Errors
///
/// Returns the first failing condition.
pub fn validate_order(
    balance: Money,
    items: &[LineItem],
    addresses: &AddressBook,
) -> Result<OrderDraft, ValidationFailure> {
    let item_count = total_count(items);
    if item_count == 0 {
        return Err(ValidationFailure::EmptyCart);
    }

    let subtotal =
        checked_total_value(items).map_err(|_| ValidationFailure::InsufficientBalance)?;
    can_checkout(balance, subtotal, addresses)?;

    let address = addresses
        .selected_address()
        .ok_or(ValidationFailure::UnknownAddress)?;

    Ok(OrderDraft {
        address_id: address.id.clone(),
        subtotal,
        item_count,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Address, ProductId, Rating};

    fn money(units: i64) -> Money {
        Money::from_major(units).unwrap()
    }

    fn one_address(selected: Option<&str>) -> AddressBook {
        AddressBook::with_selection(
            vec![Address::new("A1", "12 MG Road, Bengaluru, Karnataka 560001")],
            selected.map(AddressId::new),
        )
    }

    fn item(cost: i64, qty: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new("p1"),
            qty,
            name: "YONEX Smash Badminton Racquet".to_string(),
            category: "Sports".to_string(),
            cost: money(cost),
            rating: Rating::new(5).unwrap(),
            image: String::new(),
        }
    }

    #[test]
    fn test_balance_is_checked_before_addresses() {
        let empty = AddressBook::with_selection(Vec::new(), Some(AddressId::new("")));
        assert_eq!(
            can_checkout(money(100), money(200), &empty),
            Err(ValidationFailure::InsufficientBalance)
        );
    }

    #[test]
    fn test_no_address_on_file() {
        assert_eq!(
            can_checkout(money(500), money(200), &AddressBook::default()),
            Err(ValidationFailure::NoAddressOnFile)
        );
    }

    #[test]
    fn test_no_address_selected() {
        assert_eq!(
            can_checkout(money(500), money(200), &one_address(None)),
            Err(ValidationFailure::NoAddressSelected)
        );
    }

    #[test]
    fn test_ok_when_funded_and_selected() {
        assert_eq!(
            can_checkout(money(500), money(200), &one_address(Some("A1"))),
            Ok(())
        );
    }

    #[test]
    fn test_exact_balance_is_enough() {
        assert!(can_checkout(money(200), money(200), &one_address(Some("A1"))).is_ok());
    }

    #[test]
    fn test_validate_order_rejects_empty_cart_first() {
        assert_eq!(
            validate_order(Money::ZERO, &[], &AddressBook::default()),
            Err(ValidationFailure::EmptyCart)
        );
        assert_eq!(
            validate_order(money(500), &[item(10, 0)], &one_address(Some("A1"))),
            Err(ValidationFailure::EmptyCart)
        );
    }

    #[test]
    fn test_validate_order_rejects_unknown_selection() {
        assert_eq!(
            validate_order(money(500), &[item(50, 2)], &one_address(Some("gone"))),
            Err(ValidationFailure::UnknownAddress)
        );
    }

    #[test]
    fn test_validate_order_keeps_precedence() {
        assert_eq!(
            validate_order(money(50), &[item(50, 2)], &AddressBook::default()),
            Err(ValidationFailure::InsufficientBalance)
        );
    }

    #[test]
    fn test_validate_order_builds_draft() {
        let draft = validate_order(money(500), &[item(50, 2)], &one_address(Some("A1"))).unwrap();
        assert_eq!(draft.address_id.as_str(), "A1");
        assert_eq!(draft.subtotal, money(100));
        assert_eq!(draft.item_count, 2);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ValidationFailure::NoAddressSelected.user_message(),
            "Please select one shipping address to proceed."
        );
        assert_eq!(
            ValidationFailure::InsufficientBalance.user_message(),
            "You do not have enough balance in your wallet for this purchase"
        );
    }
}
