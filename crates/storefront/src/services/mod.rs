//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens
//! - `cart` - Cart mutation and checkout
//! - `account` - Address book and wallet balance

pub mod account;
pub mod auth;
pub mod cart;

pub use account::{AccountError, AccountService};
pub use auth::{AuthError, AuthService, LoginOutcome, TokenError, TokenIssuer};
pub use cart::{CartError, CartService};
