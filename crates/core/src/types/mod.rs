//! Core types for QKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod money;
pub mod product;
pub mod username;

pub use address::{Address, AddressBook};
pub use id::*;
pub use money::{Money, MoneyError};
pub use product::{Product, Rating, RatingError};
pub use username::{Username, UsernameError};
