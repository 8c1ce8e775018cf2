//! Shared fixtures for the FanatikJersey integration tests.
//!
//! # Running Tests
//!
//! The database tests are ignored by default. Point `DATABASE_URL` at a
//! `PostgreSQL` server the tests may create databases on, then:
//!
//! ```bash
//! cargo test -p fanatik-integration-tests -- --ignored
//! ```
//!
//! Each `#[sqlx::test]` gets a fresh database with the API migrations applied.
//!
//! # Test Categories
//!
//! - `catalog_query` - filters, search, sorting and pagination
//! - `cart_merge` - merging compatible cart additions
//! - `federated_login` - Google sign-in and username fallback
//! - `order_placement` - cart to order conversion
//! - `profile` - address limit and password reset
//! - `http_api` - the router end to end via `oneshot`

#![allow(clippy::missing_panics_doc)]

use fanatik_api::config::ApiConfig;
use fanatik_api::db::{CatalogRepository, UserRepository};
use fanatik_api::models::catalog::{
    Jersey, JerseyInput, JerseyType, JerseyTypeInput, League, LeagueInput, Team, TeamInput,
};
use fanatik_api::models::order::OrderInput;
use fanatik_api::models::user::{AddressInput, NewUser, User};
use fanatik_api::services::auth::hash_password;
use fanatik_core::{AuthProvider, Email, JerseyTypeId, Money, TeamId};
use secrecy::SecretString;
use sqlx::PgPool;

/// Password used for every fixture account.
pub const PASSWORD: &str = "Benfica1904";

/// Configuration for driving the router in tests. Email and rate limiting
/// are off.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused".to_owned()),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        jwt_secret: SecretString::from("xK9#mQ2$vL7@pR4!nT8&wZ3*bY6^hJ1%".to_owned()),
        token_ttl_minutes: 60,
        frontend_url: "http://localhost:5173".to_owned(),
        cors_origins: vec!["http://localhost:5173".to_owned()],
        rate_limit: false,
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Insert a local account with [`PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str) -> User {
    let email = Email::parse(&format!("{username}@example.com")).expect("fixture email");
    let hash = hash_password(PASSWORD).expect("hash fixture password");
    UserRepository::new(pool)
        .create(&NewUser {
            username,
            email: &email,
            password_hash: &hash,
            first_name: Some("Test"),
            last_name: Some("Fan"),
            auth_provider: AuthProvider::Local,
            google_id: None,
        })
        .await
        .expect("create fixture user")
}

pub async fn create_league(pool: &PgPool, name: &str) -> League {
    CatalogRepository::new(pool)
        .create_league(&LeagueInput {
            name: name.to_owned(),
            image_base64: None,
        })
        .await
        .expect("create fixture league")
}

pub async fn create_team(pool: &PgPool, league: &League, name: &str) -> Team {
    CatalogRepository::new(pool)
        .create_team(&TeamInput {
            name: name.to_owned(),
            league_id: league.id,
            image_base64: None,
        })
        .await
        .expect("create fixture team")
}

pub async fn create_type(pool: &PgPool, name: &str, price_cents: i64) -> JerseyType {
    CatalogRepository::new(pool)
        .create_jersey_type(&JerseyTypeInput {
            name: name.to_owned(),
            original_price: Money::from_cents(price_cents),
            current_price: Money::from_cents(price_cents),
            description: None,
        })
        .await
        .expect("create fixture jersey type")
}

pub async fn create_jersey(
    pool: &PgPool,
    team_id: TeamId,
    jersey_type_id: JerseyTypeId,
    season: &str,
    main_color: &str,
) -> Jersey {
    CatalogRepository::new(pool)
        .create_jersey(&JerseyInput {
            team_id,
            jersey_type_id,
            season: season.to_owned(),
            main_color: main_color.to_owned(),
            description: Some(format!("{season} {main_color} kit")),
            images: Vec::new(),
        })
        .await
        .expect("create fixture jersey")
}

#[must_use]
pub fn address_input(city: &str) -> AddressInput {
    serde_json::from_value(serde_json::json!({
        "first_name": "Test",
        "last_name": "Fan",
        "country": "Portugal",
        "street_address": "Avenida Eusebio da Silva Ferreira",
        "district": "Lisboa",
        "city": city,
        "postal_code": "1500-313",
        "phone_number": "+351210000000",
        "email": "fan@example.com"
    }))
    .expect("fixture address")
}

#[must_use]
pub fn order_input() -> OrderInput {
    serde_json::from_value(serde_json::json!({
        "shipping_name": "Test Fan",
        "shipping_address": "Avenida Eusebio da Silva Ferreira",
        "shipping_city": "Lisboa",
        "shipping_postal_code": "1500-313",
        "shipping_country": "Portugal",
        "shipping_phone": "+351210000000",
        "payment_method": "mbway"
    }))
    .expect("fixture order")
}
