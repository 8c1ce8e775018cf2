//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::email::EmailService;
use crate::services::token::TokenKeys;

/// Application state shared across all handlers.
///
/// Cloning is an `Arc` bump.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenKeys,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Email is disabled when the config has no SMTP settings or the relay
    /// cannot be set up; the server still starts.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl_minutes);

        let mailer = config
            .email
            .as_ref()
            .and_then(|email| match EmailService::new(email) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(error = %e, "SMTP setup failed; email disabled");
                    None
                }
            });
        if mailer.is_none() {
            tracing::warn!("Email is disabled; password reset links will not be delivered");
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                mailer,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Access token signing keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// The mailer, when email is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }
}
