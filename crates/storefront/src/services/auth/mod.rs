//! Authentication service.
//!
//! Password registration and login, plus bearer token issuance and
//! verification.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use qkart_core::{Money, Username};

use crate::db::{RepositoryError, Store};
use crate::models::UserRecord;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed bearer token.
    pub token: String,
    /// The account's username.
    pub username: Username,
    /// The account's wallet balance.
    pub balance: Money,
}

/// Authentication service.
///
/// Handles user registration, login, and bearer token verification.
pub struct AuthService<'a> {
    store: &'a Store,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a Store, tokens: &'a TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Register a new user with a starting wallet balance.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username is malformed.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        starting_balance: Money,
    ) -> Result<UserRecord, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(&username, &password_hash, starting_balance)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(username = %user.username, "registered user");
        Ok(user)
    }

    /// Log in with username and password and issue a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no such account exists.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        if username.is_empty() {
            return Err(qkart_core::UsernameError::Empty.into());
        }
        // Anything that does not parse cannot have been registered.
        let username = Username::parse(username).map_err(|_| AuthError::UserNotFound)?;

        let user = self
            .store
            .get_user(&username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(&user.username)?;
        tracing::info!(username = %user.username, "logged in");

        Ok(LoginOutcome {
            token,
            username: user.username,
            balance: user.balance,
        })
    }

    /// Verify a bearer token and return its username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is invalid or expired.
    pub fn authenticate(&self, token: &str) -> Result<Username, AuthError> {
        Ok(self.tokens.verify(token)?)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword(
            "Password is a required field".to_owned(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn fixtures() -> (Store, TokenIssuer) {
        let store = Store::from(MemoryStore::new(Vec::new()));
        let tokens = TokenIssuer::new(
            SecretString::from("k9$Qm2!vX7@pL4#zR8^wT1&nB5*cY3%h"),
            Duration::from_secs(3600),
        );
        (store, tokens)
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("").is_err());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (store, tokens) = fixtures();
        let auth = AuthService::new(&store, &tokens);

        auth.register("crio.do", "learnbydoing", Money::from_cents(500_000))
            .await
            .unwrap();
        let outcome = auth.login("crio.do", "learnbydoing").await.unwrap();

        assert_eq!(outcome.username.as_str(), "crio.do");
        assert_eq!(outcome.balance, Money::from_cents(500_000));
        assert_eq!(auth.authenticate(&outcome.token).unwrap(), outcome.username);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let (store, tokens) = fixtures();
        let auth = AuthService::new(&store, &tokens);

        auth.register("crio.do", "learnbydoing", Money::ZERO).await.unwrap();
        let err = auth
            .register("crio.do", "different", Money::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[tokio::test]
    async fn test_login_errors() {
        let (store, tokens) = fixtures();
        let auth = AuthService::new(&store, &tokens);
        auth.register("crio.do", "learnbydoing", Money::ZERO).await.unwrap();

        let err = auth.login("nobody.here", "learnbydoing").await.unwrap_err();
        assert_eq!(err.to_string(), "Username does not exist");

        let err = auth.login("crio.do", "wrong-password").await.unwrap_err();
        assert_eq!(err.to_string(), "Password is incorrect");
    }
}
