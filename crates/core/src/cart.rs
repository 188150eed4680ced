//! Cart entries, line items, and the catalog join.
//!
//! The cart store only knows `(productId, qty)` pairs. To display or price a
//! cart those pairs are joined with the catalog into [`LineItem`]s by
//! [`reconcile`]. Line items are derived data: they are recomputed whenever
//! either input changes and carry no identity of their own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Money, Product, ProductId, Rating};

/// A persisted cart line: the desired quantity of one product.
///
/// `qty == 0` is a valid transient value meaning "remove from display".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Product this entry refers to.
    pub product_id: ProductId,
    /// Desired quantity.
    pub qty: u32,
}

impl CartEntry {
    /// Create a cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// A cart entry enriched with its product's catalog details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product id (shared by the entry and the product).
    pub product_id: ProductId,
    /// Quantity from the cart entry.
    pub qty: u32,
    /// Product name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Unit price.
    pub cost: Money,
    /// Product rating.
    pub rating: Rating,
    /// Product image URL.
    pub image: String,
}

impl LineItem {
    /// Join a cart entry with its product.
    ///
    /// The caller guarantees `entry.product_id == product.id`.
    #[must_use]
    pub fn join(entry: &CartEntry, product: &Product) -> Self {
        debug_assert_eq!(entry.product_id, product.id);
        Self {
            product_id: product.id.clone(),
            qty: entry.qty,
            name: product.name.clone(),
            category: product.category.clone(),
            cost: product.cost,
            rating: product.rating,
            image: product.image.clone(),
        }
    }

    /// Whether the line should be shown (non-zero quantity).
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.qty > 0
    }

    /// `qty * cost`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.cost.checked_mul(self.qty)
    }
}

/// Join cart entries with the catalog.
///
/// For every product, in catalog order, one [`LineItem`] is emitted per cart
/// entry that references it (in cart order). Consequences:
///
/// - an empty cart or an empty catalog yields no items;
/// - entries for unknown products are dropped silently;
/// - duplicate entries for one product are all kept;
/// - display order is stable across cart mutations.
///
/// ```
/// use qkart_core::{CartEntry, Money, Product, ProductId, Rating, reconcile};
///
/// let products = vec![Product {
///     id: ProductId::new("p1"),
///     name: "Tan Leatherette Weekender Duffle".into(),
///     category: "Fashion".into(),
///     cost: Money::from_major(50).unwrap(),
///     rating: Rating::new(4).unwrap(),
///     image: "https://example.com/duffle.png".into(),
/// }];
/// let items = reconcile(&[CartEntry::new("p1", 2), CartEntry::new("gone", 1)], &products);
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].qty, 2);
/// ```
#[must_use]
pub fn reconcile(entries: &[CartEntry], products: &[Product]) -> Vec<LineItem> {
    if entries.is_empty() || products.is_empty() {
        return Vec::new();
    }

    let mut by_product: HashMap<&ProductId, Vec<&CartEntry>> = HashMap::new();
    for entry in entries {
        by_product.entry(&entry.product_id).or_default().push(entry);
    }

    products
        .iter()
        .flat_map(|product| {
            by_product
                .get(&product.id)
                .into_iter()
                .flatten()
                .map(move |entry| LineItem::join(entry, product))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: &str, cost: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Fashion".to_string(),
            cost: Money::from_major(cost).unwrap(),
            rating: Rating::new(3).unwrap(),
            image: format!("https://example.com/{id}.png"),
        }
    }

    #[test]
    fn test_empty_cart_yields_nothing() {
        assert!(reconcile(&[], &[product("p1", 10)]).is_empty());
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let entries = [CartEntry::new("p1", 1), CartEntry::new("p2", 3)];
        assert!(reconcile(&entries, &[]).is_empty());
    }

    #[test]
    fn test_single_match_is_joined_once() {
        let p = product("p1", 50);
        let items = reconcile(&[CartEntry::new("p1", 2)], std::slice::from_ref(&p));
        assert_eq!(
            items,
            vec![LineItem {
                product_id: ProductId::new("p1"),
                qty: 2,
                name: p.name.clone(),
                category: p.category.clone(),
                cost: p.cost,
                rating: p.rating,
                image: p.image.clone(),
            }]
        );
    }

    #[test]
    fn test_unknown_products_are_dropped() {
        let items = reconcile(
            &[CartEntry::new("missing", 4), CartEntry::new("p1", 1)],
            &[product("p1", 5)],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id.as_str(), "p1");
    }

    #[test]
    fn test_output_follows_catalog_order() {
        let catalog = [product("a", 1), product("b", 2), product("c", 3)];
        let entries = [
            CartEntry::new("c", 1),
            CartEntry::new("a", 1),
            CartEntry::new("b", 1),
        ];
        let ids: Vec<_> = reconcile(&entries, &catalog)
            .into_iter()
            .map(|i| i.product_id.into_inner())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_entries_are_all_emitted() {
        let items = reconcile(
            &[CartEntry::new("p1", 1), CartEntry::new("p1", 4)],
            &[product("p1", 5)],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].qty, 1);
        assert_eq!(items[1].qty, 4);
    }

    #[test]
    fn test_zero_quantity_is_kept_but_hidden() {
        let items = reconcile(&[CartEntry::new("p1", 0)], &[product("p1", 5)]);
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_visible());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let catalog = [product("a", 1), product("b", 2)];
        let entries = [CartEntry::new("b", 2), CartEntry::new("a", 7)];
        assert_eq!(reconcile(&entries, &catalog), reconcile(&entries, &catalog));
    }

    #[test]
    fn test_line_item_serializes_single_id() {
        let items = reconcile(&[CartEntry::new("p1", 1)], &[product("p1", 5)]);
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["productId"], "p1");
        assert!(json.get("_id").is_none());
    }
}
