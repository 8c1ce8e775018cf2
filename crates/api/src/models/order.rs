//! Orders and their frozen line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use fanatik_core::{JerseyId, Money, OrderId, OrderItemId, OrderStatus, PatchSet, UserId};

/// A placed order. Shipping fields are a snapshot taken at checkout.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub shipping_phone: String,
    pub nif: Option<String>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub jersey_id: Option<JerseyId>,
    pub size: String,
    pub quantity: i32,
    pub custom_name: Option<String>,
    pub custom_number: Option<String>,
    pub patches: Vec<String>,
    pub price: Money,
}

/// A purchased line. `price` is the unit price at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the jersey has been removed from the catalog.
    pub jersey_id: Option<JerseyId>,
    pub size: String,
    pub quantity: i32,
    pub custom_name: Option<String>,
    pub custom_number: Option<String>,
    pub patches: PatchSet,
    pub price: Money,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            jersey_id: row.jersey_id,
            size: row.size,
            quantity: row.quantity,
            custom_name: row.custom_name,
            custom_number: row.custom_number,
            patches: PatchSet::from(row.patches),
            price: row.price,
        }
    }
}

/// An order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Checkout form.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub shipping_phone: String,
    pub nif: Option<String>,
    pub payment_method: String,
    /// Method-specific data such as an MB WAY phone number.
    pub payment_details: Option<serde_json::Value>,
}

/// Sum of `price * quantity` over the given lines.
#[must_use]
pub fn order_total<'a>(lines: impl IntoIterator<Item = (&'a Money, i32)>) -> Money {
    lines.into_iter().map(|(price, qty)| price.times(qty)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_total() {
        let a = Money::from_cents(7000);
        let b = Money::from_cents(8999);
        assert_eq!(order_total([(&a, 2), (&b, 1)]), Money::from_cents(22999));
        assert_eq!(order_total(std::iter::empty()), Money::ZERO);
    }
}
