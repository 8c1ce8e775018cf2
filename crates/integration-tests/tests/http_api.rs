//! End-to-end HTTP tests driving the router with `oneshot`.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fanatik_api::{AppState, router};
use fanatik_api::db::UserRepository;
use fanatik_core::UserRole;
use fanatik_integration_tests::{
    PASSWORD, create_jersey, create_league, create_team, create_type, create_user, test_config,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

fn app(pool: PgPool) -> Router {
    router(AppState::new(test_config(), pool))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, identifier: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "username": identifier, "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_owned()
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_health(pool: PgPool) {
    let app = app(pool);
    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.oneshot(get("/health/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_register_login_and_profile(pool: PgPool) {
    let app = app(pool);

    let (status, user) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "eagle",
                "email": "eagle@example.com",
                "password": PASSWORD,
                "first_name": "Rui"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{user}");
    assert_eq!(user["username"], "eagle");
    assert!(user.get("hashed_password").is_none());

    let token = login(&app, "eagle@example.com").await;
    let (status, profile) = send(&app, get("/profile/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "eagle@example.com");
    assert_eq!(profile["addresses"], json!([]));
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_registration(pool: PgPool) {
    create_user(&pool, "taken").await;
    let app = app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "someone",
                "email": "taken@example.com",
                "password": PASSWORD
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_login_failures(pool: PgPool) {
    create_user(&pool, "keeper").await;
    let app = app(pool);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "username": "nobody", "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "username": "keeper", "password": "Wrong1234" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Incorrect password");
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_protected_routes_need_token(pool: PgPool) {
    let app = app(pool);

    let response = app.clone().oneshot(get("/cart", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let (status, body) = send(&app, get("/orders", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_admin_routes_check_role(pool: PgPool) {
    let user = create_user(&pool, "regular").await;
    let app = app(pool.clone());
    let token = login(&app, "regular").await;

    let league = json!({ "name": "Bundesliga" });
    let (status, _) = send(
        &app,
        json_request("POST", "/catalog/leagues", Some(&token), &league),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    UserRepository::new(&pool)
        .set_role(&user.email, UserRole::Admin)
        .await
        .unwrap();

    let (status, created) = send(
        &app,
        json_request("POST", "/catalog/leagues", Some(&token), &league),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Bundesliga");

    let (status, users) = send(&app, get("/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_catalog_query_validation(pool: PgPool) {
    let app = app(pool);

    let (status, page) = send(&app, get("/catalog/jerseys?page=1&limit=5", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
    assert_eq!(page["total_pages"], 0);

    let (status, body) = send(&app, get("/catalog/jerseys?sort_by=cheapest", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("cheapest"));

    let (status, _) = send(&app, get("/catalog/jerseys?page=0", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/catalog/jerseys/9999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_empty_cart_checkout(pool: PgPool) {
    create_user(&pool, "shopper").await;
    let app = app(pool);
    let token = login(&app, "shopper").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/orders",
            Some(&token),
            &json!({
                "shipping_name": "Shopper",
                "shipping_address": "Rua Augusta 1",
                "shipping_city": "Lisboa",
                "shipping_postal_code": "1100-048",
                "shipping_country": "Portugal",
                "shipping_phone": "+351210000000",
                "payment_method": "card"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Cart is empty");
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_forgot_password_does_not_reveal_accounts(pool: PgPool) {
    create_user(&pool, "known").await;
    let app = app(pool);

    let (known_status, known) = send(
        &app,
        json_request(
            "POST",
            "/auth/forgot-password",
            None,
            &json!({ "email": "known@example.com" }),
        ),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        json_request(
            "POST",
            "/auth/forgot-password",
            None,
            &json!({ "email": "unknown@example.com" }),
        ),
    )
    .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_malformed_json_is_bad_request(pool: PgPool) {
    let app = app(pool);
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_catalog_accepts_largest_limit(pool: PgPool) {
    let league = create_league(&pool, "Serie A").await;
    let team = create_team(&pool, &league, "Napoli").await;
    let kind = create_type(&pool, "Fan", 7000).await;
    create_jersey(&pool, team.id, kind.id, "2023/24", "blue").await;
    create_jersey(&pool, team.id, kind.id, "2024/25", "white").await;
    let app = app(pool);

    let (status, body) = send(
        &app,
        get(&format!("/catalog/jerseys?limit={}", i64::MAX), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], 2);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_google_login_cannot_claim_registered_email(pool: PgPool) {
    let boss = create_user(&pool, "boss").await;
    UserRepository::new(&pool)
        .set_role(&boss.email, UserRole::Admin)
        .await
        .unwrap();
    let app = app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/google",
            None,
            &json!({
                "email": "boss@example.com",
                "google_id": "not-the-boss",
                "first_name": "Not",
                "last_name": "Boss"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");
    assert!(body.get("access_token").is_none());

    // The account still answers to its own password only
    login(&app, "boss@example.com").await;
}

#[sqlx::test(migrator = "fanatik_api::db::MIGRATOR")]
#[ignore = "requires PostgreSQL"]
async fn test_google_login_creates_then_reuses_account(pool: PgPool) {
    let app = app(pool);
    let identity = json!({
        "email": "rui@example.com",
        "google_id": "g-1001",
        "first_name": "Rui",
        "last_name": "Costa",
        "username": "maestro"
    });

    let (status, first) = send(&app, json_request("POST", "/auth/google", None, &identity)).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["token_type"], "bearer");
    let token = first["access_token"].as_str().unwrap().to_owned();

    let (status, profile) = send(&app, get("/profile/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "maestro");
    assert_eq!(profile["auth_provider"], "google");

    let (status, second) = send(&app, json_request("POST", "/auth/google", None, &identity)).await;
    assert_eq!(status, StatusCode::OK);
    let token = second["access_token"].as_str().unwrap();
    let (_, again) = send(&app, get("/profile/me", Some(token))).await;
    assert_eq!(again["id"], profile["id"]);
}
