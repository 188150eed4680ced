//! Domain models for the storefront.
//!
//! - [`user`] - Account records as stored by the document store
//! - [`order`] - Checkout planning shared by every store backend

pub mod order;
pub mod user;

pub use order::{CheckoutError, CheckoutPlan, OrderReceipt, plan_checkout};
pub use user::UserRecord;
