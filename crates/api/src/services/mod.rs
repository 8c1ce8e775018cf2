//! Business logic services.
//!
//! - `auth` - registration, login, Google sign-in, password reset
//! - `email` - SMTP delivery of account emails
//! - `token` - signed access tokens

pub mod auth;
pub mod email;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use token::{AccessToken, TokenError, TokenKeys};
