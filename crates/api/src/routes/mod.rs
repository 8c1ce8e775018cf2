//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database reachable)
//!
//! # Auth (rate limited)
//! POST   /auth/register             - Register a local account
//! POST   /auth/login                - Username/email + password -> token
//! POST   /auth/google               - Google identity -> token
//! POST   /auth/forgot-password      - Email a reset link (always 200)
//! POST   /auth/reset-password       - Set a new password with a reset token
//!
//! # Users (admin)
//! GET    /users                     - List accounts
//!
//! # Profile (bearer token)
//! GET    /profile/me                - Profile with addresses and images
//! PUT    /profile/me/info           - Update names, email, username
//! PUT    /profile/me/password       - Change password
//! POST   /profile/me/image          - Upload a profile image
//! POST   /profile/me/address        - Add an address (max 3)
//! PUT    /profile/me/address/{id}   - Update an address
//! DELETE /profile/me/address/{id}   - Delete an address
//!
//! # Catalog (writes are admin)
//! GET    /catalog/types             POST /catalog/types
//! PUT    /catalog/types/{id}        DELETE /catalog/types/{id}
//! GET    /catalog/leagues           POST /catalog/leagues
//! DELETE /catalog/leagues/{id}
//! GET    /catalog/teams?league_id=  POST /catalog/teams
//! DELETE /catalog/teams/{id}
//! GET    /catalog/jerseys           POST /catalog/jerseys
//! GET    /catalog/jerseys/{id}      PUT /catalog/jerseys/{id}
//! DELETE /catalog/jerseys/{id}
//!
//! # Cart (bearer token)
//! GET    /cart                      - Lines with jerseys
//! POST   /cart                      - Add, merging compatible lines
//! DELETE /cart/{id}                 - Remove a line
//! DELETE /cart                      - Clear
//!
//! # Orders (bearer token)
//! POST   /orders                    - Place an order from the cart
//! GET    /orders                    - Newest first
//! GET    /orders/{id}               - Order with items
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod extract;
pub mod orders;
pub mod profile;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{from_fn, map_response},
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::middleware::{
    auth_rate_limiter, make_request_span, rate_limited_json, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google_login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(profile::me))
        .route("/me/info", put(profile::update_info))
        .route("/me/password", put(profile::change_password))
        .route("/me/image", post(profile::upload_image))
        .route("/me/address", post(profile::create_address))
        .route(
            "/me/address/{id}",
            put(profile::update_address).delete(profile::delete_address),
        )
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/types", get(catalog::list_types).post(catalog::create_type))
        .route(
            "/types/{id}",
            put(catalog::update_type).delete(catalog::delete_type),
        )
        .route(
            "/leagues",
            get(catalog::list_leagues).post(catalog::create_league),
        )
        .route("/leagues/{id}", axum::routing::delete(catalog::delete_league))
        .route("/teams", get(catalog::list_teams).post(catalog::create_team))
        .route("/teams/{id}", axum::routing::delete(catalog::delete_team))
        .route(
            "/jerseys",
            get(catalog::list_jerseys).post(catalog::create_jersey),
        )
        .route(
            "/jerseys/{id}",
            get(catalog::get_jersey)
                .put(catalog::update_jersey)
                .delete(catalog::delete_jersey),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/{id}", axum::routing::delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::place))
        .route("/{id}", get(orders::show))
}

/// CORS allow-list from configuration. Origins that are not valid header
/// values are skipped with a warning.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the full application with middleware.
pub fn router(state: AppState) -> Router {
    let mut auth = auth_routes();
    if state.config().rate_limit {
        match auth_rate_limiter() {
            Some(limiter) => {
                auth = auth.layer(limiter).layer(map_response(rate_limited_json));
            }
            None => tracing::warn!("Rate limiter config rejected; /auth is not rate limited"),
        }
    }

    let cors = cors_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth)
        .route("/users", get(users::list))
        .nest("/profile", profile_routes())
        .nest("/catalog", catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
