//! Account management commands.
//!
//! These are the only way to create an admin: the API never lets a user
//! change their own role.

use fanatik_api::db::{RepositoryError, users::UserRepository};
use fanatik_core::{Email, UserRole};
use sqlx::PgPool;

use super::CommandError;

fn unknown(email: &Email) -> impl FnOnce(RepositoryError) -> CommandError + '_ {
    move |e| match e {
        RepositoryError::NotFound => CommandError::UnknownUser(email.to_string()),
        other => other.into(),
    }
}

/// Grant admin privileges.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no account has this email.
pub async fn promote(pool: &PgPool, email: &Email) -> Result<(), CommandError> {
    let user = UserRepository::new(pool)
        .set_role(email, UserRole::Admin)
        .await
        .map_err(unknown(email))?;
    tracing::info!(user_id = %user.id, "Promoted {} to admin", user.username);
    Ok(())
}

/// Revoke admin privileges.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no account has this email.
pub async fn demote(pool: &PgPool, email: &Email) -> Result<(), CommandError> {
    let user = UserRepository::new(pool)
        .set_role(email, UserRole::User)
        .await
        .map_err(unknown(email))?;
    tracing::info!(user_id = %user.id, "Demoted {} to user", user.username);
    Ok(())
}

/// Enable or disable sign-in. Existing tokens stop working on the next
/// request because every authenticated request reloads the account.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no account has this email.
pub async fn set_active(pool: &PgPool, email: &Email, active: bool) -> Result<(), CommandError> {
    let user = UserRepository::new(pool)
        .set_active(email, active)
        .await
        .map_err(unknown(email))?;
    let state = if active { "activated" } else { "deactivated" };
    tracing::info!(user_id = %user.id, "Account {} {state}", user.username);
    Ok(())
}

/// Log every admin account.
///
/// # Errors
///
/// Returns `CommandError::Repository` if the query fails.
pub async fn list_admins(pool: &PgPool) -> Result<(), CommandError> {
    let admins = UserRepository::new(pool).list_by_role(UserRole::Admin).await?;
    if admins.is_empty() {
        tracing::info!("No admin accounts");
        return Ok(());
    }
    for admin in &admins {
        tracing::info!(
            "  {} {} <{}>{}",
            admin.id,
            admin.username,
            admin.email,
            if admin.is_active { "" } else { " (inactive)" }
        );
    }
    Ok(())
}
