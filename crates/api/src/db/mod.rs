//! Database operations for the shop `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users`, `addresses`, `user_images` - Accounts and profile data
//! - `leagues`, `teams`, `jersey_types`, `jerseys`, `jersey_images` - Catalog
//! - `cart_items` - One row per customized jersey in a cart
//! - `orders`, `order_items` - Placed orders with frozen prices
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded in
//! [`MIGRATOR`] and run via:
//! ```bash
//! cargo run -p fanatik-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Schema migrations compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("{0}")]
    Conflict(String),

    /// The user already has the maximum number of saved addresses.
    #[error("address limit reached (max {max})")]
    AddressLimit {
        /// Maximum addresses per user.
        max: i64,
    },

    /// Checkout was attempted with no cart items.
    #[error("cart is empty")]
    CartEmpty,

    /// Merging into a cart line would push its quantity past `max`.
    #[error("quantity too large (max {max})")]
    QuantityLimit {
        /// Largest quantity a cart line can hold.
        max: i32,
    },
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
pub(crate) fn map_conflict(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
