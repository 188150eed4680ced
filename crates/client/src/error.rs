//! Client error taxonomy.

use thiserror::Error;

use qkart_core::{UsernameError, ValidationFailure};

use crate::config::ClientConfigError;

/// Generic text for failures that did not come from the service.
pub const TRANSPORT_MESSAGE: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

/// Errors from client operations.
///
/// Every failure is terminal for the action that triggered it: nothing is
/// retried and no partial state is applied.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A local check failed before anything was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// A form field failed local validation.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Network unreachable, timed out, or the body could not be decoded.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service refused the request (4xx) with a message.
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// The service failed (5xx).
    #[error("server error (HTTP {status})")]
    ServerFault {
        /// HTTP status.
        status: u16,
    },

    /// The credential was refused; the session has been destroyed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The operation needs a logged-in session.
    #[error("not logged in")]
    NotLoggedIn,

    /// The product is already in the cart.
    #[error("item already in cart")]
    AlreadyInCart,

    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] ClientConfigError),
}

impl ClientError {
    /// Text to show the user for this failure.
    ///
    /// Rejections are shown verbatim; everything that did not come from the
    /// service gets one generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(failure) => failure.user_message().to_owned(),
            Self::Form(err) => err.to_string(),
            Self::Rejected { message, .. } | Self::Unauthorized(message) => message.clone(),
            Self::NotLoggedIn => "Please login in to Add products to Cart".to_owned(),
            Self::AlreadyInCart => {
                "Item already in cart. Use the cart sidebar to update quantity or remove item."
                    .to_owned()
            }
            Self::Transport(_) | Self::ServerFault { .. } | Self::Config(_) => {
                TRANSPORT_MESSAGE.to_owned()
            }
        }
    }

    /// Whether the service rejected the session's credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(ClientConfigError::InvalidUrl(err))
    }
}

/// Register and login form errors, checked before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Username is missing or malformed.
    #[error(transparent)]
    Username(#[from] UsernameError),
    /// Password field is empty.
    #[error("Password is a required field")]
    PasswordRequired,
    /// Password is shorter than `min` characters.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Confirmation does not match the password.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = ClientError::Rejected {
            status: 400,
            message: "Password is incorrect".to_owned(),
        };
        assert_eq!(err.user_message(), "Password is incorrect");

        let err = ClientError::ServerFault { status: 503 };
        assert_eq!(err.user_message(), TRANSPORT_MESSAGE);

        let err = ClientError::from(ValidationFailure::NoAddressOnFile);
        assert_eq!(
            err.user_message(),
            "Please add a new address before proceeding."
        );
    }
}
