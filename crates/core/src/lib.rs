//! QKart Core - domain types and the pure cart model.
//!
//! This crate is shared by every QKart component:
//! - `storefront` - REST service (auth, catalog, cart, addresses, checkout)
//! - `client` - typed HTTP client and client-side storefront state
//! - `cli` - migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here is deterministic and safe to call
//! from any task.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, usernames, products and addresses
//! - [`cart`] - Cart entries, line items and the catalog join ([`cart::reconcile`])
//! - [`pricing`] - Subtotal and item-count aggregation
//! - [`checkout`] - Order gating on balance and address state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod types;

pub use cart::{CartEntry, LineItem, reconcile};
pub use checkout::{OrderDraft, ValidationFailure, can_checkout, validate_order};
pub use pricing::{CartTotals, checked_total_value, total_count, total_value};
pub use types::*;
