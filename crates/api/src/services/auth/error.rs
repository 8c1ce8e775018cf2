//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] fanatik_core::EmailError),

    /// Username is blank.
    #[error("Username is required")]
    MissingUsername,

    /// Password does not meet the strength rules.
    #[error("{0}")]
    WeakPassword(String),

    /// Email already registered.
    #[error("Email already registered")]
    DuplicateEmail,

    /// Username already taken.
    #[error("Username already taken")]
    DuplicateUsername,

    /// No account matches the identifier.
    #[error("User not found")]
    UserNotFound,

    /// Wrong password.
    #[error("Incorrect password")]
    InvalidCredentials,

    /// Account is deactivated.
    #[error("Account is inactive")]
    Inactive,

    /// Operation needs a local password but the account signs in with Google.
    #[error("Accounts that sign in with Google cannot change their password here")]
    FederatedAccount,

    /// New password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Reset token unknown, used or expired.
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// Access token could not be issued or verified.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
