//! Saved shipping addresses.

use sqlx::PgPool;

use fanatik_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::user::{Address, AddressInput};

/// Maximum saved addresses per user.
pub const MAX_ADDRESSES_PER_USER: i64 = 3;

const ADDRESS_COLUMNS: &str = "id, user_id, first_name, last_name, country, street_address, \
                               district, city, postal_code, phone_number, email";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's addresses, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY id");
        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(addresses)
    }

    /// Save a new address.
    ///
    /// The user row is locked while counting so two concurrent requests cannot
    /// both take the last free slot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::AddressLimit` if the user already has
    /// [`MAX_ADDRESSES_PER_USER`] addresses; nothing is written.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= MAX_ADDRESSES_PER_USER {
            return Err(RepositoryError::AddressLimit {
                max: MAX_ADDRESSES_PER_USER,
            });
        }

        let sql = format!(
            "INSERT INTO addresses \
                 (user_id, first_name, last_name, country, street_address, district, city, \
                  postal_code, phone_number, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ADDRESS_COLUMNS}"
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.country)
            .bind(&input.street_address)
            .bind(&input.district)
            .bind(&input.city)
            .bind(&input.postal_code)
            .bind(&input.phone_number)
            .bind(&input.email)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Replace every field of an owned address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let sql = format!(
            "UPDATE addresses \
             SET first_name = $3, last_name = $4, country = $5, street_address = $6, \
                 district = $7, city = $8, postal_code = $9, phone_number = $10, email = $11 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.country)
            .bind(&input.street_address)
            .bind(&input.district)
            .bind(&input.city)
            .bind(&input.postal_code)
            .bind(&input.phone_number)
            .bind(&input.email)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an owned address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
