//! Account domain types.
//!
//! Rows are decoded straight into these types; the password hash never leaves
//! the repository except through [`UserWithHash`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use fanatik_core::{AddressId, AuthProvider, Email, UserId, UserImageId, UserRole};

/// A shop account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_active: bool,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub auth_provider: AuthProvider,
    /// Federated subject id; not exposed to clients.
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash, for credential checks.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithHash {
    #[sqlx(flatten)]
    pub user: User,
    /// Empty for federated accounts.
    pub hashed_password: String,
}

/// Fields needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub auth_provider: AuthProvider,
    pub google_id: Option<&'a str>,
}

/// A saved shipping address. A user may keep at most three.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub street_address: String,
    pub district: String,
    pub city: String,
    pub postal_code: String,
    pub phone_number: String,
    pub email: Email,
}

/// Address fields supplied by the client on create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub street_address: String,
    pub district: String,
    pub city: String,
    pub postal_code: String,
    pub phone_number: String,
    pub email: Email,
}

/// A profile picture stored as base64 text.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserImage {
    pub id: UserImageId,
    pub user_id: UserId,
    pub image_data: String,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub addresses: Vec<Address>,
    pub user_images: Vec<UserImage>,
}
