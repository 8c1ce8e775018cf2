//! User repository for database operations.
//!
//! Queries are checked at runtime and decoded with `FromRow`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fanatik_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::{NewUser, User, UserImage, UserWithHash};

const USER_COLUMNS: &str = "id, username, email, is_active, role, first_name, last_name, \
                            auth_provider, google_id, created_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by their Google subject id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE google_id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(google_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Whether a username is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Whether an email is registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Find a user and password hash by username or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserWithHash>, RepositoryError> {
        // Emails are stored with a lower-cased domain.
        let email = Email::parse(identifier).map_or_else(|_| identifier.to_owned(), String::from);
        let sql = format!(
            "SELECT {USER_COLUMNS}, hashed_password FROM users \
             WHERE username = $1 OR email = $2 \
             ORDER BY (username = $1) DESC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, UserWithHash>(&sql)
            .bind(identifier)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a user and password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserWithHash>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, hashed_password FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserWithHash>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email, username or Google id
    /// already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users \
                 (username, email, hashed_password, first_name, last_name, auth_provider, google_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(new.username)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.first_name)
            .bind(new.last_name)
            .bind(new.auth_provider)
            .bind(new.google_id)
            .fetch_one(self.pool)
            .await
            .map_err(unique_user_conflict)
    }

    /// Replace names, email and username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username belongs to
    /// another account.
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_info(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
        email: &Email,
        username: &str,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users \
             SET first_name = $2, last_name = $3, email = $4, username = $5 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(username)
            .fetch_optional(self.pool)
            .await
            .map_err(unique_user_conflict)?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a password reset token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_token_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires_at)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Consume an unexpired reset token, setting a new password hash.
    ///
    /// The token is cleared in the same statement, so it can succeed only once.
    /// Returns `None` when the token is unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, UserId>(
            r"
            UPDATE users
            SET hashed_password = $2, reset_token = NULL, reset_token_expires = NULL
            WHERE reset_token = $1 AND reset_token_expires > $3
            RETURNING id
            ",
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }

    /// List every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(self.pool).await?;
        Ok(users)
    }

    /// List accounts with the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(self.pool)
            .await?;
        Ok(users)
    }

    /// Change the role of the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let sql = format!("UPDATE users SET role = $2 WHERE email = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(role)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Enable or disable sign-in for the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    pub async fn set_active(&self, email: &Email, active: bool) -> Result<User, RepositoryError> {
        let sql =
            format!("UPDATE users SET is_active = $2 WHERE email = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Store a profile image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_image(
        &self,
        user_id: UserId,
        image_data: &str,
    ) -> Result<UserImage, RepositoryError> {
        let image = sqlx::query_as::<_, UserImage>(
            "INSERT INTO user_images (user_id, image_data) VALUES ($1, $2) \
             RETURNING id, user_id, image_data",
        )
        .bind(user_id)
        .bind(image_data)
        .fetch_one(self.pool)
        .await?;
        Ok(image)
    }

    /// A user's profile images, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_images(&self, user_id: UserId) -> Result<Vec<UserImage>, RepositoryError> {
        let images = sqlx::query_as::<_, UserImage>(
            "SELECT id, user_id, image_data FROM user_images WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }
}

/// Map a unique violation on `users` to a conflict naming the duplicated column.
fn unique_user_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("users_email_key") => "Email already registered",
            Some("users_username_key") => "Username already taken",
            Some("users_google_id_key") => "Google account already registered",
            _ => "Account already exists",
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

