//! Order repository.
//!
//! Placing an order reads the cart with row locks, inserts the order and one
//! item per cart line, then empties the cart, all in one transaction.

use sqlx::PgPool;

use fanatik_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use super::cart::fetch_rows;
use crate::models::order::{Order, OrderDetail, OrderInput, OrderItem, OrderItemRow, order_total};

const ORDER_COLUMNS: &str = "id, user_id, shipping_name, shipping_address, shipping_city, \
                             shipping_postal_code, shipping_country, shipping_phone, nif, \
                             total_amount, status, payment_method, payment_details, created_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, jersey_id, size, quantity, custom_name, custom_number, patches, price";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// The total is the sum of each line's captured unit price times its
    /// quantity. Current catalog prices are not consulted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CartEmpty` if the cart has no lines; no order
    /// is created.
    pub async fn place(
        &self,
        user_id: UserId,
        input: &OrderInput,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = fetch_rows(&mut tx, user_id, true).await?;
        if lines.is_empty() {
            return Err(RepositoryError::CartEmpty);
        }

        let total = order_total(lines.iter().map(|l| (&l.final_price, l.quantity)));

        let sql = format!(
            "INSERT INTO orders \
                 (user_id, shipping_name, shipping_address, shipping_city, shipping_postal_code, \
                  shipping_country, shipping_phone, nif, total_amount, status, payment_method, \
                  payment_details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(&input.shipping_name)
            .bind(&input.shipping_address)
            .bind(&input.shipping_city)
            .bind(&input.shipping_postal_code)
            .bind(&input.shipping_country)
            .bind(&input.shipping_phone)
            .bind(&input.nif)
            .bind(total)
            .bind(OrderStatus::Pending)
            .bind(&input.payment_method)
            .bind(&input.payment_details)
            .fetch_one(&mut *tx)
            .await?;

        let item_sql = format!(
            "INSERT INTO order_items \
                 (order_id, jersey_id, size, quantity, custom_name, custom_number, patches, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ORDER_ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let row = sqlx::query_as::<_, OrderItemRow>(&item_sql)
                .bind(order.id)
                .bind(line.jersey_id)
                .bind(&line.size)
                .bind(line.quantity)
                .bind(&line.custom_name)
                .bind(&line.custom_number)
                .bind(&line.patches)
                .bind(line.final_price)
                .fetch_one(&mut *tx)
                .await?;
            items.push(OrderItem::from(row));
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            items = items.len(),
            total = %order.total_amount,
            "Order placed"
        );

        Ok(OrderDetail { order, items })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// An owned order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist or
    /// belongs to another user.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<OrderDetail, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let items = sqlx::query_as::<_, OrderItemRow>(&sql)
            .bind(id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(OrderItem::from)
            .collect();

        Ok(OrderDetail { order, items })
    }
}
