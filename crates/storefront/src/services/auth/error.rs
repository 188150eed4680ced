//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] qkart_core::UsernameError),

    /// Password too short or missing.
    #[error("{0}")]
    WeakPassword(String),

    /// Username is already registered.
    #[error("Username already exists")]
    UserAlreadyExists,

    /// No account with this username.
    #[error("Username does not exist")]
    UserNotFound,

    /// Password does not match.
    #[error("Password is incorrect")]
    InvalidCredentials,

    /// Bearer token rejected.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
