//! Subtotal and item-count aggregation over line items.
//!
//! All sums are integer cents, so the result does not depend on the order of
//! the items.

use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::types::{Money, MoneyError};

/// Sum of `qty * cost` over all items, reporting overflow.
///
/// # Errors
///
/// Returns `MoneyError::Overflow` if the total does not fit in cents.
pub fn checked_total_value(items: &[LineItem]) -> Result<Money, MoneyError> {
    items.iter().try_fold(Money::ZERO, |acc, item| {
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or(MoneyError::Overflow)
    })
}

/// Sum of `qty * cost` over all items; zero for no items.
///
/// Saturates at [`Money::MAX`], which no validated cart can reach.
#[must_use]
pub fn total_value(items: &[LineItem]) -> Money {
    checked_total_value(items).unwrap_or(Money::MAX)
}

/// Sum of quantities; zero for no items.
#[must_use]
pub fn total_count(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.qty)).sum()
}

/// The order summary shown next to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Shipping charges (always free).
    pub shipping: Money,
    /// Amount payable.
    pub total: Money,
    /// Number of units across all lines.
    pub item_count: u64,
}

impl CartTotals {
    /// Compute totals for a set of line items.
    #[must_use]
    pub fn from_items(items: &[LineItem]) -> Self {
        let subtotal = total_value(items);
        Self {
            subtotal,
            shipping: Money::ZERO,
            total: subtotal,
            item_count: total_count(items),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartEntry, reconcile};
    use crate::types::{Product, ProductId, Rating};

    fn item(id: &str, cost_cents: i64, qty: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            qty,
            name: id.to_string(),
            category: "Sports".to_string(),
            cost: Money::from_cents(cost_cents),
            rating: Rating::new(5).unwrap(),
            image: String::new(),
        }
    }

    #[test]
    fn test_empty_totals_are_zero() {
        assert_eq!(total_value(&[]), Money::ZERO);
        assert_eq!(total_count(&[]), 0);
        assert_eq!(checked_total_value(&[]), Ok(Money::ZERO));
    }

    #[test]
    fn test_total_value_sums_lines() {
        let items = [item("a", 1_050, 2), item("b", 99, 3)];
        assert_eq!(total_value(&items), Money::from_cents(2_100 + 297));
    }

    #[test]
    fn test_total_value_is_permutation_invariant() {
        let mut items = vec![
            item("a", 1_999, 3),
            item("b", 1, 7),
            item("c", 45_000, 1),
            item("d", 333, 0),
        ];
        let expected = total_value(&items);
        items.reverse();
        assert_eq!(total_value(&items), expected);
        items.rotate_left(2);
        assert_eq!(total_value(&items), expected);
    }

    #[test]
    fn test_total_count_sums_quantities() {
        let items = [item("a", 1, 2), item("b", 1, 0), item("c", 1, 5)];
        assert_eq!(total_count(&items), 7);
    }

    #[test]
    fn test_overflow_is_reported() {
        let items = [item("a", i64::MAX, 2)];
        assert_eq!(checked_total_value(&items), Err(MoneyError::Overflow));
        assert_eq!(total_value(&items), Money::MAX);
    }

    #[test]
    fn test_cart_scenario() {
        let products = [Product {
            id: ProductId::new("p1"),
            name: "UNIFACTOR Mens Running Shoes".to_string(),
            category: "Fashion".to_string(),
            cost: Money::from_major(50).unwrap(),
            rating: Rating::new(5).unwrap(),
            image: String::new(),
        }];
        let items = reconcile(&[CartEntry::new("p1", 2)], &products);
        assert_eq!(items.len(), 1);
        assert_eq!(total_value(&items), Money::from_major(100).unwrap());
        assert_eq!(total_count(&items), 2);

        let totals = CartTotals::from_items(&items);
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, totals.subtotal);
    }
}
