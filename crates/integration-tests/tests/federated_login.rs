//! Google sign-in against a real database.

#![allow(clippy::unwrap_used)]

use fanatik_api::db::UserRepository;
use fanatik_api::services::auth::{AuthError, AuthService, GoogleIdentity};
use fanatik_api::services::token::TokenKeys;
use fanatik_core::{AuthProvider, UserId, UserRole};
use fanatik_integration_tests::{create_user, test_config};
use sqlx::PgPool;

fn keys() -> TokenKeys {
    let config = test_config();
    TokenKeys::new(&config.jwt_secret, config.token_ttl_minutes)
}

fn identity<'a>(email: &'a str, google_id: &'a str) -> GoogleIdentity<'a> {
    GoogleIdentity {
        email,
        google_id,
        first_name: "Test",
        last_name: "Fan",
        username: None,
    }
}

async fn stored_hash(pool: &PgPool, user_id: UserId) -> String {
    sqlx::query_scalar("SELECT hashed_password FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_first_sign_in_creates_google_account(pool: PgPool) {
    let keys = keys();
    let auth = AuthService::new(&pool, &keys);

    let (user, token) = auth
        .federated_login(identity("rui@example.com", "g-1001"))
        .await
        .unwrap();

    assert_eq!(user.auth_provider, AuthProvider::Google);
    assert_eq!(user.google_id.as_deref(), Some("g-1001"));
    assert_eq!(user.role, UserRole::User);
    assert_eq!(user.first_name.as_deref(), Some("Test"));
    assert!(!token.access_token.is_empty());
    assert!(stored_hash(&pool, user.id).await.is_empty());
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_second_sign_in_returns_same_account(pool: PgPool) {
    let keys = keys();
    let auth = AuthService::new(&pool, &keys);

    let (first, _) = auth
        .federated_login(identity("rui@example.com", "g-1001"))
        .await
        .unwrap();
    let (second, _) = auth
        .federated_login(identity("rui@example.com", "g-1001"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.username, second.username);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_registered_email_is_not_taken_over(pool: PgPool) {
    let owner = create_user(&pool, "boss").await;
    UserRepository::new(&pool)
        .set_role(&owner.email, UserRole::Admin)
        .await
        .unwrap();

    let keys = keys();
    let err = AuthService::new(&pool, &keys)
        .federated_login(identity(owner.email.as_str(), "someone-else"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::DuplicateEmail));
    let stored = UserRepository::new(&pool)
        .get_by_id(owner.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.google_id, None);
    assert_eq!(stored.auth_provider, AuthProvider::Local);
    assert!(
        UserRepository::new(&pool)
            .get_by_google_id("someone-else")
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_requested_username_is_used_when_free(pool: PgPool) {
    let keys = keys();
    let (user, _) = AuthService::new(&pool, &keys)
        .federated_login(GoogleIdentity {
            username: Some("  eusebio  "),
            ..identity("eusebio@example.com", "g-1965")
        })
        .await
        .unwrap();

    assert_eq!(user.username, "eusebio");
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_taken_username_falls_back_to_name_with_digits(pool: PgPool) {
    create_user(&pool, "taken").await;

    let keys = keys();
    let (user, _) = AuthService::new(&pool, &keys)
        .federated_login(GoogleIdentity {
            username: Some("taken"),
            ..identity("newfan@example.com", "g-2002")
        })
        .await
        .unwrap();

    let suffix = user.username.strip_prefix("testfan").unwrap();
    assert_eq!(suffix.len(), 4);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(suffix.chars().next(), Some('0'));
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_deactivated_google_account_is_refused(pool: PgPool) {
    let keys = keys();
    let auth = AuthService::new(&pool, &keys);
    let (user, _) = auth
        .federated_login(identity("rui@example.com", "g-1001"))
        .await
        .unwrap();
    UserRepository::new(&pool)
        .set_active(&user.email, false)
        .await
        .unwrap();

    let err = auth
        .federated_login(identity("rui@example.com", "g-1001"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Inactive));
}
