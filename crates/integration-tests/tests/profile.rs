//! Address limit and password reset against a real database.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use fanatik_api::db::{AddressRepository, RepositoryError, UserRepository};
use fanatik_api::services::auth::{AuthError, AuthService};
use fanatik_api::services::token::TokenKeys;
use fanatik_integration_tests::{PASSWORD, address_input, create_user, test_config};
use sqlx::PgPool;

fn keys() -> TokenKeys {
    let config = test_config();
    TokenKeys::new(&config.jwt_secret, config.token_ttl_minutes)
}

async fn stored_token(pool: &PgPool, user_id: fanatik_core::UserId) -> Option<String> {
    sqlx::query_scalar("SELECT reset_token FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_fourth_address_rejected(pool: PgPool) {
    let user = create_user(&pool, "traveller").await;
    let repo = AddressRepository::new(&pool);

    for city in ["Lisboa", "Porto", "Faro"] {
        repo.create(user.id, &address_input(city)).await.unwrap();
    }
    let err = repo.create(user.id, &address_input("Braga")).await.unwrap_err();

    assert!(matches!(err, RepositoryError::AddressLimit { max: 3 }));
    let cities: Vec<String> = repo
        .list(user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.city)
        .collect();
    assert_eq!(cities, ["Lisboa", "Porto", "Faro"]);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_address_ownership(pool: PgPool) {
    let owner = create_user(&pool, "homeowner").await;
    let other = create_user(&pool, "intruder").await;
    let repo = AddressRepository::new(&pool);
    let address = repo.create(owner.id, &address_input("Lisboa")).await.unwrap();

    let err = repo.delete(other.id, address.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    let err = repo
        .update(other.id, address.id, &address_input("Porto"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_reset_token_is_single_use(pool: PgPool) {
    let user = create_user(&pool, "forgetful").await;
    let keys = keys();
    let auth = AuthService::new(&pool, &keys);

    auth.issue_password_reset_token(user.email.as_str())
        .await
        .unwrap();
    let token = stored_token(&pool, user.id).await.unwrap();
    assert_eq!(token.len(), 43);

    let reset = auth
        .reset_password(&token, "NewPass123", "NewPass123")
        .await
        .unwrap();
    assert_eq!(reset, user.id);
    assert!(stored_token(&pool, user.id).await.is_none());

    let again = auth
        .reset_password(&token, "Another123", "Another123")
        .await
        .unwrap_err();
    assert!(matches!(again, AuthError::InvalidResetToken));

    let (logged_in, _) = auth.login(&user.username, "NewPass123").await.unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_expired_reset_token_rejected(pool: PgPool) {
    let user = create_user(&pool, "latecomer").await;
    UserRepository::new(&pool)
        .set_reset_token(user.id, "stale-token", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let keys = keys();
    let err = AuthService::new(&pool, &keys)
        .reset_password("stale-token", "NewPass123", "NewPass123")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResetToken));

    // The old password still works
    AuthService::new(&pool, &keys)
        .login(&user.username, PASSWORD)
        .await
        .unwrap();
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_unknown_email_reset_is_silent(pool: PgPool) {
    let keys = keys();
    AuthService::new(&pool, &keys)
        .issue_password_reset_token("ghost@example.com")
        .await
        .unwrap();
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_deactivated_account_cannot_log_in(pool: PgPool) {
    let user = create_user(&pool, "benched").await;
    UserRepository::new(&pool)
        .set_active(&user.email, false)
        .await
        .unwrap();

    let keys = keys();
    let err = AuthService::new(&pool, &keys)
        .login(user.email.as_str(), PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Inactive));
}
