//! Authentication route handlers.
//!
//! Registration, login, Google sign-in and the password reset flow. Login
//! endpoints return `{access_token, token_type}` for use as a bearer token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::models::user::User;
use crate::routes::extract::JsonBody;
use crate::services::auth::{AuthService, GoogleIdentity, Registration};
use crate::services::token::AccessToken;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login accepts a username or an email in one field.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub email: String,
    pub google_id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// A confirmation body for actions with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a local account.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool(), state.tokens())
        .register(Registration {
            username: &body.username,
            email: &body.email,
            password: &body.password,
            first_name: body.first_name.as_deref(),
            last_name: body.last_name.as_deref(),
        })
        .await?;
    Ok(Json(user))
}

/// Log in with username or email and password.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<AccessToken>> {
    let (user, token) = AuthService::new(state.pool(), state.tokens())
        .login(&body.identifier, &body.password)
        .await?;

    let user_id = user.id.to_string();
    add_breadcrumb("auth", "Logged in", Some(&[("user_id", &user_id)]));
    Ok(Json(token))
}

/// Log in with an identity asserted by Google.
#[instrument(skip(state, body))]
pub async fn google_login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GoogleLoginRequest>,
) -> Result<Json<AccessToken>> {
    let (user, token) = AuthService::new(state.pool(), state.tokens())
        .federated_login(GoogleIdentity {
            email: &body.email,
            google_id: &body.google_id,
            first_name: &body.first_name,
            last_name: &body.last_name,
            username: body.username.as_deref(),
        })
        .await?;

    let user_id = user.id.to_string();
    add_breadcrumb("auth", "Logged in with Google", Some(&[("user_id", &user_id)]));
    Ok(Json(token))
}

/// Start a password reset. Always answers the same way so the response does
/// not reveal whether the email has an account.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.tokens())
        .with_mailer(state.mailer(), &state.config().frontend_url)
        .issue_password_reset_token(&body.email)
        .await?;

    Ok(Json(MessageResponse {
        message: "If the email is registered, a reset link has been sent",
    }))
}

/// Finish a password reset with the emailed token.
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.tokens())
        .reset_password(&body.token, &body.new_password, &body.confirm_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset",
    }))
}
