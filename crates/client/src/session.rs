//! Logged-in session.

use secrecy::{ExposeSecret, SecretString};

use qkart_core::{Money, Username};

/// Credential and cached account data for one login.
///
/// Created by a successful login and dropped on logout or when the service
/// rejects the token. The balance is a display copy; checkout always asks
/// the service for the real figure.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    username: Username,
    balance: Money,
}

impl Session {
    /// Create a session from login results.
    #[must_use]
    pub const fn new(token: SecretString, username: Username, balance: Money) -> Self {
        Self {
            token,
            username,
            balance,
        }
    }

    /// The bearer token. Opaque to the client.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// The logged-in username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Last known wallet balance.
    #[must_use]
    pub const fn balance(&self) -> Money {
        self.balance
    }

    /// Whether both values come from the same login.
    #[must_use]
    pub fn same_login(&self, other: &Self) -> bool {
        self.token.expose_secret() == other.token.expose_secret()
    }

    /// Replace the cached balance.
    pub const fn set_balance(&mut self, balance: Money) {
        self.balance = balance;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("balance", &self.balance)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new(
            SecretString::from("abc.def"),
            Username::parse("crio.do").unwrap(),
            Money::from_cents(500_000),
        );
        let debug = format!("{session:?}");
        assert!(!debug.contains("abc.def"));
        assert_eq!(session.token(), "abc.def");
    }

    #[test]
    fn test_same_login_compares_tokens() {
        let user = Username::parse("crio.do").unwrap();
        let first = Session::new(SecretString::from("a.1"), user.clone(), Money::ZERO);
        let mut copy = first.clone();
        copy.set_balance(Money::from_cents(100));
        let second = Session::new(SecretString::from("a.2"), user, Money::ZERO);

        assert!(first.same_login(&copy));
        assert!(!first.same_login(&second));
    }
}
