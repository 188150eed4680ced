//! Storefront account model.

use chrono::{DateTime, Utc};

use qkart_core::{Money, Username};

/// A registered account.
///
/// The password hash is a PHC string produced by Argon2id.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique login name.
    pub username: Username,
    /// Argon2id PHC hash of the password.
    pub password_hash: String,
    /// Wallet balance (authoritative).
    pub balance: Money,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
