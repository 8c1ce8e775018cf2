//! Profile route handlers for the signed-in user.
//!
//! Every handler takes [`CurrentUser`]; addresses and images are scoped to
//! that user, so another user's address id answers 404.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use fanatik_core::{AddressId, Email};

use crate::db::{AddressRepository, UserRepository};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::user::{Address, AddressInput, Profile, User, UserImage};
use crate::routes::auth::MessageResponse;
use crate::routes::extract::{JsonBody, PathParam, not_found, required};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateInfoRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageUploadRequest {
    pub image_data: String,
}

async fn load_profile(state: &AppState, user: User) -> Result<Profile> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    let user_images = UserRepository::new(state.pool())
        .list_images(user.id)
        .await?;
    Ok(Profile {
        user,
        addresses,
        user_images,
    })
}

fn validate_address(input: &AddressInput) -> Result<()> {
    let fields = [
        (input.first_name.as_str(), "first_name"),
        (input.last_name.as_str(), "last_name"),
        (input.country.as_str(), "country"),
        (input.street_address.as_str(), "street_address"),
        (input.district.as_str(), "district"),
        (input.city.as_str(), "city"),
        (input.postal_code.as_str(), "postal_code"),
        (input.phone_number.as_str(), "phone_number"),
    ];
    for (value, field) in fields {
        required(value, field)?;
    }
    Ok(())
}

/// The user with addresses and images.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Profile>> {
    Ok(Json(load_profile(&state, user).await?))
}

/// Replace names, email and username.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<UpdateInfoRequest>,
) -> Result<Json<Profile>> {
    let username = required(&body.username, "username")?;
    let updated = UserRepository::new(state.pool())
        .update_info(
            user.id,
            body.first_name.trim(),
            body.last_name.trim(),
            &body.email,
            username,
        )
        .await?;
    Ok(Json(load_profile(&state, updated).await?))
}

/// Change the password of a local account.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.tokens())
        .change_password(
            user.id,
            &body.old_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;
    Ok(Json(MessageResponse {
        message: "Password changed",
    }))
}

/// Store a base64 profile image.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<ImageUploadRequest>,
) -> Result<Json<UserImage>> {
    let image_data = required(&body.image_data, "image_data")?;
    let image = UserRepository::new(state.pool())
        .add_image(user.id, image_data)
        .await?;
    Ok(Json(image))
}

/// Save a new address; a user keeps at most three.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<AddressInput>,
) -> Result<Json<Address>> {
    validate_address(&body)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &body)
        .await?;
    Ok(Json(address))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<AddressId>,
    JsonBody(body): JsonBody<AddressInput>,
) -> Result<Json<Address>> {
    validate_address(&body)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &body)
        .await
        .map_err(not_found("Address not found"))?;
    Ok(Json(address))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<AddressId>,
) -> Result<Json<MessageResponse>> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await
        .map_err(not_found("Address not found"))?;
    Ok(Json(MessageResponse {
        message: "Address deleted",
    }))
}
