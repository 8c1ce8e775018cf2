//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use fanatik_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CurrentUser;
use crate::models::order::{Order, OrderDetail, OrderInput};
use crate::routes::extract::{JsonBody, PathParam, not_found, required};
use crate::state::AppState;

fn validate_order(input: &OrderInput) -> Result<()> {
    let fields = [
        (input.shipping_name.as_str(), "shipping_name"),
        (input.shipping_address.as_str(), "shipping_address"),
        (input.shipping_city.as_str(), "shipping_city"),
        (input.shipping_postal_code.as_str(), "shipping_postal_code"),
        (input.shipping_country.as_str(), "shipping_country"),
        (input.shipping_phone.as_str(), "shipping_phone"),
        (input.payment_method.as_str(), "payment_method"),
    ];
    for (value, field) in fields {
        required(value, field)?;
    }
    Ok(())
}

/// Turn the cart into a pending order.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<OrderInput>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    validate_order(&body)?;
    let order = OrderRepository::new(state.pool())
        .place(user.id, &body)
        .await?;

    let order_id = order.order.id.to_string();
    add_breadcrumb("orders", "Placed order", Some(&[("order_id", &order_id)]));
    Ok((StatusCode::CREATED, Json(order)))
}

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await
        .map_err(not_found("Order not found"))?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str) -> OrderInput {
        serde_json::from_value(serde_json::json!({
            "shipping_name": name,
            "shipping_address": "Rua Augusta 1",
            "shipping_city": "Lisboa",
            "shipping_postal_code": "1100-048",
            "shipping_country": "Portugal",
            "shipping_phone": "912345678",
            "payment_method": "mbway",
            "payment_details": {"phone": "912345678"}
        }))
        .unwrap()
    }

    #[test]
    fn test_complete_order_is_valid() {
        let order = input("Ana Silva");
        assert!(order.nif.is_none());
        assert!(validate_order(&order).is_ok());
    }

    #[test]
    fn test_blank_shipping_name_rejected() {
        assert!(validate_order(&input(" ")).is_err());
    }
}
