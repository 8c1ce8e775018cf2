//! Cart repository with line-item merging.
//!
//! Adding a jersey that is already in the cart with the same size, name,
//! number and patches increases that line's quantity instead of creating a
//! second row. The merge candidate lookup and the write run in one
//! transaction with the candidate rows locked.

use sqlx::{PgConnection, PgPool};

use fanatik_core::{CartItemId, JerseyId, UserId};

use super::RepositoryError;
use super::catalog::load_jerseys;
use crate::models::cart::{CartItem, CartItemInput, CartItemRow};

const CART_COLUMNS: &str = "id, user_id, jersey_id, size, quantity, custom_name, custom_number, \
                            patches, final_price";

/// Whether a cart addition created a row or grew an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAddOutcome {
    Inserted,
    Merged,
}

/// Pick the row an addition merges into, if any.
#[must_use]
pub fn find_merge_target<'r>(
    candidates: &'r [CartItemRow],
    item: &CartItemInput,
) -> Option<&'r CartItemRow> {
    candidates.iter().find(|row| row.merges_with(item))
}

/// Quantity of a line after merging `added` into `current`.
///
/// # Errors
///
/// Returns `RepositoryError::QuantityLimit` if the sum does not fit the
/// quantity column.
pub fn merged_quantity(current: i32, added: i32) -> Result<i32, RepositoryError> {
    current
        .checked_add(added)
        .ok_or(RepositoryError::QuantityLimit { max: i32::MAX })
}

/// Cart rows for a user, locked when `for_update` is set.
pub(crate) async fn fetch_rows(
    conn: &mut PgConnection,
    user_id: UserId,
    for_update: bool,
) -> Result<Vec<CartItemRow>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY id{lock}");
    let rows = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's cart lines with their jerseys, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = fetch_rows(&mut conn, user_id, false).await?;

        let mut ids: Vec<JerseyId> = rows.iter().map(|r| r.jersey_id).collect();
        ids.sort_unstable_by_key(JerseyId::as_i32);
        ids.dedup();
        let jerseys = load_jerseys(&mut conn, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let jersey = jerseys.get(&row.jersey_id).cloned();
                CartItem::from_row(row, jersey)
            })
            .collect())
    }

    /// Add a customized jersey, merging with a compatible existing line.
    ///
    /// On merge the quantity grows and the stored unit price is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the jersey does not exist.
    /// Returns `RepositoryError::QuantityLimit` if the merged quantity is out
    /// of range. The cart is left unchanged.
    pub async fn add(
        &self,
        user_id: UserId,
        item: &CartItemInput,
    ) -> Result<(CartItem, CartAddOutcome), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let jersey_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM jerseys WHERE id = $1)")
                .bind(item.jersey_id)
                .fetch_one(&mut *tx)
                .await?;
        if !jersey_exists {
            return Err(RepositoryError::NotFound);
        }

        // Exact-field narrowing; patch sets are compared in Rust.
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items \
             WHERE user_id = $1 AND jersey_id = $2 AND size = $3 \
               AND custom_name IS NOT DISTINCT FROM $4 \
               AND custom_number IS NOT DISTINCT FROM $5 \
             ORDER BY id \
             FOR UPDATE"
        );
        let candidates = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(user_id)
            .bind(item.jersey_id)
            .bind(&item.size)
            .bind(&item.custom_name)
            .bind(&item.custom_number)
            .fetch_all(&mut *tx)
            .await?;

        let (row, outcome) = if let Some(target) = find_merge_target(&candidates, item) {
            let quantity = merged_quantity(target.quantity, item.quantity)?;
            let sql = format!(
                "UPDATE cart_items SET quantity = $2 WHERE id = $1 \
                 RETURNING {CART_COLUMNS}"
            );
            let row = sqlx::query_as::<_, CartItemRow>(&sql)
                .bind(target.id)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;
            (row, CartAddOutcome::Merged)
        } else {
            let sql = format!(
                "INSERT INTO cart_items \
                     (user_id, jersey_id, size, quantity, custom_name, custom_number, patches, final_price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING {CART_COLUMNS}"
            );
            let row = sqlx::query_as::<_, CartItemRow>(&sql)
                .bind(user_id)
                .bind(item.jersey_id)
                .bind(&item.size)
                .bind(item.quantity)
                .bind(&item.custom_name)
                .bind(&item.custom_number)
                .bind(item.patches.to_vec())
                .bind(item.final_price)
                .fetch_one(&mut *tx)
                .await?;
            (row, CartAddOutcome::Inserted)
        };

        let jersey = load_jerseys(&mut tx, &[row.jersey_id])
            .await?
            .remove(&row.jersey_id);
        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            cart_item_id = %row.id,
            quantity = row.quantity,
            outcome = ?outcome,
            "Cart updated"
        );

        Ok((CartItem::from_row(row, jersey), outcome))
    }

    /// Remove one owned line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another user.
    pub async fn remove(&self, user_id: UserId, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line in a user's cart. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fanatik_core::Money;

    use super::*;

    fn row(id: i32, patches: &[&str]) -> CartItemRow {
        CartItemRow {
            id: CartItemId::new(id),
            user_id: UserId::new(1),
            jersey_id: JerseyId::new(3),
            size: "L".to_owned(),
            quantity: 1,
            custom_name: None,
            custom_number: None,
            patches: patches.iter().map(|p| (*p).to_owned()).collect(),
            final_price: Money::from_cents(7000),
        }
    }

    fn item(patches: &[&str]) -> CartItemInput {
        serde_json::from_value(serde_json::json!({
            "jersey_id": 3,
            "size": "L",
            "patches": patches,
            "final_price": "70.00"
        }))
        .unwrap()
    }

    #[test]
    fn test_picks_row_with_equal_patch_set() {
        let candidates = vec![row(1, &[]), row(2, &["UCL", "Liga"]), row(3, &["UCL"])];
        let target = find_merge_target(&candidates, &item(&["Liga", "UCL"])).unwrap();
        assert_eq!(target.id, CartItemId::new(2));
    }

    #[test]
    fn test_no_target_for_new_patch_set() {
        let candidates = vec![row(1, &[]), row(2, &["UCL"])];
        assert!(find_merge_target(&candidates, &item(&["Liga"])).is_none());
    }

    #[test]
    fn test_no_target_without_candidates() {
        assert!(find_merge_target(&[], &item(&[])).is_none());
    }

    #[test]
    fn test_merged_quantity() {
        assert_eq!(merged_quantity(2, 3).unwrap(), 5);
        assert_eq!(merged_quantity(i32::MAX - 1, 1).unwrap(), i32::MAX);
        assert!(matches!(
            merged_quantity(i32::MAX, 1),
            Err(RepositoryError::QuantityLimit { max: i32::MAX })
        ));
    }
}
