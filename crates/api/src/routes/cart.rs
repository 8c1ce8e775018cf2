//! Cart route handlers.
//!
//! Adding a jersey the cart already holds with the same size, name, number
//! and patches grows that line instead of adding a new one.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use fanatik_core::CartItemId;

use crate::db::CartRepository;
use crate::db::cart::CartAddOutcome;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CurrentUser;
use crate::models::cart::{CartItem, CartItemInput};
use crate::routes::auth::MessageResponse;
use crate::routes::extract::{JsonBody, PathParam, not_found, required};
use crate::state::AppState;

fn validate_item(item: &CartItemInput) -> Result<()> {
    required(&item.size, "size")?;
    if item.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_owned(),
        ));
    }
    if item.final_price.is_negative() {
        return Err(AppError::BadRequest(
            "Price cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

/// The cart with each line's jersey.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CartItem>>> {
    let items = CartRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(items))
}

/// Add a customized jersey. 201 for a new line, 200 when merged.
#[instrument(skip(state, user, body), fields(user_id = %user.id, jersey_id = %body.jersey_id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<CartItemInput>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let item = body.normalized();
    validate_item(&item)?;

    let (line, outcome) = CartRepository::new(state.pool())
        .add(user.id, &item)
        .await
        .map_err(not_found("Jersey not found"))?;

    let jersey_id = item.jersey_id.to_string();
    add_breadcrumb("cart", "Added jersey", Some(&[("jersey_id", &jersey_id)]));

    let status = match outcome {
        CartAddOutcome::Inserted => StatusCode::CREATED,
        CartAddOutcome::Merged => StatusCode::OK,
    };
    Ok((status, Json(line)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<CartItemId>,
) -> Result<Json<MessageResponse>> {
    CartRepository::new(state.pool())
        .remove(user.id, id)
        .await
        .map_err(not_found("Cart item not found"))?;
    Ok(Json(MessageResponse {
        message: "Item removed from cart",
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(MessageResponse {
        message: "Cart cleared",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(json: serde_json::Value) -> CartItemInput {
        serde_json::from_value::<CartItemInput>(json).unwrap().normalized()
    }

    #[test]
    fn test_valid_item() {
        let ok = item(serde_json::json!({
            "jersey_id": 1, "size": "M", "final_price": "75.00"
        }));
        assert_eq!(ok.quantity, 1);
        assert!(validate_item(&ok).is_ok());
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let bad = item(serde_json::json!({
            "jersey_id": 1, "size": "M", "quantity": 0, "final_price": "75.00"
        }));
        assert!(validate_item(&bad).is_err());
    }

    #[test]
    fn test_rejects_negative_price() {
        let bad = item(serde_json::json!({
            "jersey_id": 1, "size": "M", "final_price": "-1.00"
        }));
        assert!(validate_item(&bad).is_err());
    }

    #[test]
    fn test_rejects_blank_size() {
        let bad = item(serde_json::json!({
            "jersey_id": 1, "size": "  ", "final_price": "75.00"
        }));
        assert!(validate_item(&bad).is_err());
    }
}
