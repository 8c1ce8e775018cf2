//! Access tokens: HS256 JWTs whose subject is the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fanatik_core::UserId;

/// Errors from issuing or verifying an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, expiry or structure check failed.
    #[error("invalid or expired token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// The subject claim is not a user id.
    #[error("invalid token subject")]
    InvalidSubject,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Issued at (Unix seconds).
    pub iat: i64,
}

/// The `{access_token, token_type}` body returned by login endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_minutes: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Sign a token for `user_id` valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<AccessToken, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(AccessToken {
            access_token: token,
            token_type: "bearer",
        })
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature or an expired token,
    /// and `TokenError::InvalidSubject` if `sub` is not a user id.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        data.claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::InvalidSubject)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(secret: &str, ttl: i64) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret.to_owned()), ttl)
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("k9$Lw2!pQ7zR4@xN8#vB3^mT6&yH1*cF", 60);
        let token = keys.issue(UserId::new(42)).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(keys.verify(&token.access_token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = keys("k9$Lw2!pQ7zR4@xN8#vB3^mT6&yH1*cF", 60)
            .issue(UserId::new(1))
            .unwrap();
        let other = keys("Zq8#Yt5!Rw2@Pv9$Ns4^Lm7&Kj1*Hg3%", 60);
        assert!(matches!(
            other.verify(&token.access_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_expired() {
        // Well past the default 60s leeway.
        let keys = keys("k9$Lw2!pQ7zR4@xN8#vB3^mT6&yH1*cF", -10);
        let token = keys.issue(UserId::new(1)).unwrap();
        assert!(keys.verify(&token.access_token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let keys = keys("k9$Lw2!pQ7zR4@xN8#vB3^mT6&yH1*cF", 60);
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
