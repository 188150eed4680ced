//! Register and login form checks.
//!
//! These run before any request so obviously bad input never reaches the
//! service. The service repeats the checks that matter.

use qkart_core::Username;

use crate::error::FormError;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the fields in display order and return the parsed username.
    ///
    /// # Errors
    ///
    /// Returns the first failing field check.
    pub fn validate(&self) -> Result<Username, FormError> {
        let username = Username::parse(&self.username)?;
        if self.password.is_empty() {
            return Err(FormError::PasswordRequired);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FormError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(username)
    }
}

/// Login form input.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Both fields must be filled in; nothing else is checked locally.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for an empty field.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.username.is_empty() {
            return Err(FormError::Username(qkart_core::UsernameError::Empty));
        }
        if self.password.is_empty() {
            return Err(FormError::PasswordRequired);
        }
        Ok(())
    }
}
