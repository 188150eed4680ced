//! Catalog products.

use serde::{Deserialize, Serialize};

use super::{Money, ProductId};

/// Error returned for a rating outside `0..=5`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 0 and {max} (got {got})", max = Rating::MAX)]
pub struct RatingError {
    got: u8,
}

/// A star rating between 0 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` if `stars` is greater than 5.
    pub const fn new(stars: u8) -> Result<Self, RatingError> {
        if stars > Self::MAX {
            return Err(RatingError { got: stars });
        }
        Ok(Self(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A purchasable product, owned by the catalog.
///
/// Products are immutable from the cart's point of view: the cart model only
/// reads them when joining cart entries into line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category label (e.g. "Fashion", "Electronics").
    pub category: String,
    /// Unit price.
    pub cost: Money,
    /// Star rating.
    pub rating: Rating,
    /// Image URL.
    pub image: String,
}

impl Product {
    /// Whether this product matches a search query.
    ///
    /// Matches are case-insensitive substrings of the name or the category.
    /// An empty (or all-whitespace) query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.category.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: ProductId::new("KCRwjF7lN97HnEaY"),
            name: "Atomberg 1200mm BLDC Fan".to_string(),
            category: "Home & Kitchen".to_string(),
            cost: Money::from_cents(349_900),
            rating: Rating::new(4).unwrap(),
            image: "https://crio-directus-assets.s3.ap-south-1.amazonaws.com/fan.png".to_string(),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_ok());
        assert!(Rating::new(5).is_ok());
        assert!(Rating::new(6).is_err());
    }

    #[test]
    fn test_matches_name_and_category() {
        let p = sample();
        assert!(p.matches("fan"));
        assert!(p.matches("KITCHEN"));
        assert!(p.matches("  bldc "));
        assert!(!p.matches("shoes"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(sample().matches(""));
        assert!(sample().matches("   "));
    }

    #[test]
    fn test_wire_format_uses_underscore_id() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["_id"], "KCRwjF7lN97HnEaY");
        assert_eq!(json["cost"], 3499);
        assert_eq!(json["rating"], 4);
    }

    #[test]
    fn test_deserialize_rejects_bad_rating() {
        let json = r#"{"_id":"x","name":"n","category":"c","cost":1,"rating":9,"image":"i"}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }
}
