//! Authentication error types.
//!
//! The display strings of the client-facing variants are the messages sent in
//! the response body.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Blank display name.
    #[error("User validation failed: name is required")]
    InvalidName,

    /// Invalid email format.
    #[error("User validation failed: email: Please provide a valid email address")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Password does not meet the policy.
    #[error(
        "Password must contain at least 8 characters, including uppercase, lowercase, number, and special character"
    )]
    WeakPassword,

    /// Another account already uses the email.
    #[error("{0}: email already exist")]
    EmailTaken(String),

    /// No account with that email.
    #[error("Wrong email")]
    WrongEmail,

    /// Password does not match.
    #[error("Wrong password")]
    WrongPassword,

    /// Signin attempted while a session is active.
    #[error("User already signed in")]
    AlreadySignedIn,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error is the caller's fault rather than the server's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}
