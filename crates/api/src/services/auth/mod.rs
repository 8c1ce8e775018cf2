//! Authentication service.
//!
//! Local password accounts, Google sign-in and the password reset flow.
//! Successful logins return a signed access token.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use sqlx::PgPool;

use fanatik_core::{AuthProvider, Email, UserId};

use crate::db::users::UserRepository;
use crate::models::user::{NewUser, User};
use crate::services::email::{EmailService, reset_link};
use crate::services::token::{AccessToken, TokenKeys};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Reset tokens are valid for this long after issue.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Random bytes in a reset token before encoding.
const RESET_TOKEN_BYTES: usize = 32;

/// Attempts at a free generated username before giving up.
const USERNAME_ATTEMPTS: usize = 32;

/// Profile fields supplied at registration.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Identity asserted by Google after a successful sign-in.
#[derive(Debug, Clone, Copy)]
pub struct GoogleIdentity<'a> {
    pub email: &'a str,
    pub google_id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub username: Option<&'a str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenKeys,
    mailer: Option<&'a EmailService>,
    frontend_url: &'a str,
}

impl<'a> AuthService<'a> {
    /// Create a service that signs tokens with `tokens` and sends no email.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            mailer: None,
            frontend_url: "",
        }
    }

    /// Deliver reset links through `mailer`, pointing at `frontend_url`.
    #[must_use]
    pub const fn with_mailer(
        mut self,
        mailer: Option<&'a EmailService>,
        frontend_url: &'a str,
    ) -> Self {
        self.mailer = mailer;
        self.frontend_url = frontend_url;
        self
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a local account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingUsername` if the username is blank.
    /// Returns `AuthError::WeakPassword` if the password is too weak.
    /// Returns `AuthError::DuplicateEmail` or `AuthError::DuplicateUsername`
    /// if either is already taken.
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let email = Email::parse(registration.email)?;
        let username = registration.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        validate_password(registration.password)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.users.username_exists(username).await? {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = hash_password(registration.password)?;
        let user = self
            .users
            .create(&NewUser {
                username,
                email: &email,
                password_hash: &password_hash,
                first_name: non_blank(registration.first_name),
                last_name: non_blank(registration.last_name),
                auth_provider: AuthProvider::Local,
                google_id: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Log in with a username or email and a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account matches.
    /// Returns `AuthError::InvalidCredentials` for a wrong password or a
    /// Google-only account.
    /// Returns `AuthError::Inactive` if the account is deactivated.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(User, AccessToken), AuthError> {
        let found = self
            .users
            .get_with_hash_by_identifier(identifier.trim())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if found.hashed_password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        verify_password(password, &found.hashed_password)?;

        let user = found.user;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    // =========================================================================
    // Google Sign-In
    // =========================================================================

    /// Log in with a Google identity, creating the account on first sight.
    ///
    /// The account carrying the Google id is used when there is one.
    /// Otherwise a new Google account is created with an empty password
    /// hash. An existing account is never attached to a Google id here, so
    /// an email that is already registered is refused.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::DuplicateEmail` if another account owns the email.
    /// Returns `AuthError::Inactive` if the account is deactivated.
    pub async fn federated_login(
        &self,
        identity: GoogleIdentity<'_>,
    ) -> Result<(User, AccessToken), AuthError> {
        let email = Email::parse(identity.email)?;

        let user = if let Some(user) = self.users.get_by_google_id(identity.google_id).await? {
            user
        } else if self.users.email_exists(&email).await? {
            tracing::warn!("Google sign-in refused for an email owned by another account");
            return Err(AuthError::DuplicateEmail);
        } else {
            let username = self.pick_username(&identity, &email).await?;
            let created = self
                .users
                .create(&NewUser {
                    username: &username,
                    email: &email,
                    password_hash: "",
                    first_name: non_blank(Some(identity.first_name)),
                    last_name: non_blank(Some(identity.last_name)),
                    auth_provider: AuthProvider::Google,
                    google_id: Some(identity.google_id),
                })
                .await?;
            tracing::info!(user_id = %created.id, "Account created from Google sign-in");
            created
        };

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    async fn pick_username(
        &self,
        identity: &GoogleIdentity<'_>,
        email: &Email,
    ) -> Result<String, AuthError> {
        if let Some(requested) = identity.username.map(str::trim)
            && !requested.is_empty()
            && !self.users.username_exists(requested).await?
        {
            return Ok(requested.to_owned());
        }

        let base = username_base(identity.first_name, identity.last_name, email);
        for _ in 0..USERNAME_ATTEMPTS {
            // ThreadRng is !Send; it must not live across the await below.
            let candidate = with_suffix(&base, rand::rng().random_range(1000..10_000));
            if !self.users.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        tracing::warn!(base = %base, "No free username after retries");
        Err(AuthError::DuplicateUsername)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset token for a local account and email the link.
    ///
    /// Unknown emails and Google accounts are silently ignored so the caller
    /// can always report success. Delivery failures are logged and the token
    /// stays valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn issue_password_reset_token(&self, email: &str) -> Result<(), AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(());
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        if user.auth_provider != AuthProvider::Local {
            tracing::debug!(user_id = %user.id, "Password reset requested for Google account");
            return Ok(());
        }

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.users.set_reset_token(user.id, &token, expires_at).await?;

        match self.mailer {
            Some(mailer) => {
                let url = reset_link(self.frontend_url, &token);
                if let Err(e) = mailer
                    .send_password_reset(
                        user.email.as_str(),
                        &user.username,
                        &url,
                        RESET_TOKEN_TTL_MINUTES,
                    )
                    .await
                {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to send reset email");
                }
            }
            None => {
                tracing::warn!(user_id = %user.id, "Email disabled; reset link not sent");
            }
        }

        Ok(())
    }

    /// Set a new password with a reset token. The token works once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the passwords differ.
    /// Returns `AuthError::WeakPassword` if the new password is too weak.
    /// Returns `AuthError::InvalidResetToken` if the token is unknown, used
    /// or expired.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<UserId, AuthError> {
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        let user_id = self
            .users
            .consume_reset_token(token, &password_hash, Utc::now())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(user_id)
    }

    /// Change the password of a signed-in local account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FederatedAccount` for Google accounts.
    /// Returns `AuthError::InvalidCredentials` if the old password is wrong.
    /// Returns `AuthError::PasswordMismatch` or `AuthError::WeakPassword`
    /// if the new password is rejected.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let found = self
            .users
            .get_with_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if found.user.auth_provider == AuthProvider::Google || found.hashed_password.is_empty() {
            return Err(AuthError::FederatedAccount);
        }
        verify_password(old_password, &found.hashed_password)?;
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        Ok(())
    }

    /// Resolve a verified token subject to an active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    /// Returns `AuthError::Inactive` if it was deactivated.
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }
}

/// Check the password strength rules.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` naming the first rule that fails.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "Password must contain an uppercase letter".to_owned(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::WeakPassword(
            "Password must contain a lowercase letter".to_owned(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "Password must contain a digit".to_owned(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// 32 random bytes, URL-safe base64 without padding.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lower-case ASCII slug of the name, falling back to the email local part.
fn username_base(first_name: &str, last_name: &str, email: &Email) -> String {
    let slug = |s: &str| -> String {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };

    let from_name = format!("{}{}", slug(first_name), slug(last_name));
    if !from_name.is_empty() {
        return from_name;
    }
    let from_email = slug(email.local_part());
    if from_email.is_empty() {
        "fan".to_owned()
    } else {
        from_email
    }
}

fn with_suffix(base: &str, suffix: u16) -> String {
    format!("{base}{suffix}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Abcde1").is_ok());
        assert!(validate_password("Ab1").is_err());
        assert!(validate_password("abcdef1").is_err());
        assert!(validate_password("ABCDEF1").is_err());
        assert!(validate_password("Abcdefg").is_err());
    }

    #[test]
    fn test_password_rule_message_names_failure() {
        let err = validate_password("abcdef1").unwrap_err();
        assert!(err.to_string().contains("uppercase"));
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secret123", &hash).is_ok());
        assert!(matches!(
            verify_password("Secret124", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_empty_hash() {
        assert!(matches!(
            verify_password("Secret123", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        // 32 bytes -> 43 base64 characters without padding.
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_username_base_from_name() {
        let email = Email::parse("x@example.com").unwrap();
        assert_eq!(username_base("João", "Félix", &email), "jooflix");
        assert_eq!(username_base("Cristiano", "Ronaldo", &email), "cristianoronaldo");
    }

    #[test]
    fn test_username_base_falls_back() {
        let email = Email::parse("cr.seven@example.com").unwrap();
        assert_eq!(username_base("", "  ", &email), "crseven");
        let email = Email::parse("._@example.com").unwrap();
        assert_eq!(username_base("", "", &email), "fan");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("fan", 1234), "fan1234");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Ana ")), Some("Ana"));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }
}
