//! Shipping addresses and the client-side address selection.

use serde::{Deserialize, Serialize};

use super::AddressId;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier.
    #[serde(rename = "_id")]
    pub id: AddressId,
    /// Free-form address text.
    #[serde(rename = "address")]
    pub text: String,
}

impl Address {
    /// Create an address.
    #[must_use]
    pub fn new(id: impl Into<AddressId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// The user's address book plus the currently selected shipping address.
///
/// Selection is transient, client-local state. The book tolerates a selection
/// that is not (or no longer) in `all`; checkout validation reports that case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    all: Vec<Address>,
    selected: Option<AddressId>,
}

impl AddressBook {
    /// Create an address book with no selection.
    #[must_use]
    pub const fn new(all: Vec<Address>) -> Self {
        Self {
            all,
            selected: None,
        }
    }

    /// Create an address book with an explicit (unchecked) selection.
    ///
    /// An empty id is treated as "nothing selected".
    #[must_use]
    pub fn with_selection(all: Vec<Address>, selected: Option<AddressId>) -> Self {
        Self {
            all,
            selected: selected.filter(|id| !id.is_empty()),
        }
    }

    /// All saved addresses.
    #[must_use]
    pub fn all(&self) -> &[Address] {
        &self.all
    }

    /// The selected address id, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&AddressId> {
        self.selected.as_ref()
    }

    /// The selected address, if it is in the book.
    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected.as_ref()?;
        self.all.iter().find(|a| &a.id == id)
    }

    /// Whether the book has no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Whether the book contains an address with this id.
    #[must_use]
    pub fn contains(&self, id: &AddressId) -> bool {
        self.all.iter().any(|a| &a.id == id)
    }

    /// Select an address. Returns `false` (leaving the selection unchanged)
    /// if no address has this id.
    pub fn select(&mut self, id: &AddressId) -> bool {
        if self.contains(id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace the saved addresses (e.g. with the server's list after an add
    /// or delete). The selection survives only if it is still present.
    pub fn replace_all(&mut self, all: Vec<Address>) {
        self.all = all;
        if let Some(id) = &self.selected
            && !self.contains(id)
        {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> AddressBook {
        AddressBook::new(vec![
            Address::new("a1", "221B Baker Street, London NW1 6XE"),
            Address::new("a2", "742 Evergreen Terrace, Springfield"),
        ])
    }

    #[test]
    fn test_select_known_address() {
        let mut b = book();
        assert!(b.select(&AddressId::new("a2")));
        assert_eq!(b.selected(), Some(&AddressId::new("a2")));
        assert_eq!(
            b.selected_address().map(|a| a.text.as_str()),
            Some("742 Evergreen Terrace, Springfield")
        );
    }

    #[test]
    fn test_select_unknown_address_is_ignored() {
        let mut b = book();
        assert!(!b.select(&AddressId::new("zz")));
        assert_eq!(b.selected(), None);
    }

    #[test]
    fn test_replace_all_drops_deleted_selection() {
        let mut b = book();
        b.select(&AddressId::new("a1"));
        b.replace_all(vec![Address::new("a2", "742 Evergreen Terrace, Springfield")]);
        assert_eq!(b.selected(), None);
    }

    #[test]
    fn test_replace_all_keeps_surviving_selection() {
        let mut b = book();
        b.select(&AddressId::new("a2"));
        b.replace_all(vec![Address::new("a2", "742 Evergreen Terrace, Springfield")]);
        assert_eq!(b.selected(), Some(&AddressId::new("a2")));
    }

    #[test]
    fn test_with_selection_treats_empty_id_as_none() {
        let b = AddressBook::with_selection(Vec::new(), Some(AddressId::new("")));
        assert_eq!(b.selected(), None);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Address::new("a1", "somewhere")).unwrap_or_default();
        assert_eq!(json["_id"], "a1");
        assert_eq!(json["address"], "somewhere");
    }
}
