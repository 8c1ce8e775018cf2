//! Bearer token extractors.
//!
//! Handlers take [`CurrentUser`] to require a signed-in, active account, or
//! [`RequireAdmin`] to additionally require the admin role.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Extractor that requires a valid bearer token for an active account.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extractor that requires an admin account.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_owned()))?;

        let user_id = state
            .tokens()
            .verify(token)
            .map_err(|_| AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()))?;

        let user = AuthService::new(state.pool(), state.tokens())
            .current_user(user_id)
            .await
            .map_err(|e| match e {
                AuthError::UserNotFound => AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()),
                other => AppError::Auth(other),
            })?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(AppError::Forbidden("Admin privileges required".to_owned()));
        }
        Ok(Self(user))
    }
}
