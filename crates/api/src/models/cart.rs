//! Cart line items.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use fanatik_core::{CartItemId, JerseyId, Money, PatchSet, UserId};

use super::catalog::Jersey;

/// One cart row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
    pub id: CartItemId,
    pub user_id: UserId,
    pub jersey_id: JerseyId,
    pub size: String,
    pub quantity: i32,
    pub custom_name: Option<String>,
    pub custom_number: Option<String>,
    pub patches: Vec<String>,
    pub final_price: Money,
}

impl CartItemRow {
    /// Whether adding `item` to the cart should increase this row's quantity.
    ///
    /// The candidate query already matched user, jersey, size, name and
    /// number; this adds the patch set comparison.
    #[must_use]
    pub fn merges_with(&self, item: &CartItemInput) -> bool {
        self.jersey_id == item.jersey_id
            && self.size == item.size
            && self.custom_name == item.custom_name
            && self.custom_number == item.custom_number
            && item.patches.matches(&self.patches)
    }
}

/// A customized jersey the shopper wants to add.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemInput {
    pub jersey_id: JerseyId,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub custom_name: Option<String>,
    pub custom_number: Option<String>,
    #[serde(default)]
    pub patches: PatchSet,
    /// Unit price after customization, computed by the frontend.
    pub final_price: Money,
}

const fn default_quantity() -> i32 {
    1
}

impl CartItemInput {
    /// Blank customization text means no customization.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.size = self.size.trim().to_owned();
        self.custom_name = normalize_optional(self.custom_name);
        self.custom_number = normalize_optional(self.custom_number);
        self
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// A cart line returned to the client, with the full jersey.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub jersey_id: JerseyId,
    pub jersey: Option<Jersey>,
    pub size: String,
    pub quantity: i32,
    pub custom_name: Option<String>,
    pub custom_number: Option<String>,
    pub patches: PatchSet,
    pub final_price: Money,
}

impl CartItem {
    pub(crate) fn from_row(row: CartItemRow, jersey: Option<Jersey>) -> Self {
        Self {
            id: row.id,
            jersey_id: row.jersey_id,
            jersey,
            size: row.size,
            quantity: row.quantity,
            custom_name: row.custom_name,
            custom_number: row.custom_number,
            patches: PatchSet::from(row.patches),
            final_price: row.final_price,
        }
    }
}
