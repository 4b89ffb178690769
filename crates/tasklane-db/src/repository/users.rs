//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;
use crate::utils::format_timestamp;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// Returns `DbError::Duplicate` if the email is already registered, whether
    /// that is seen by the pre-check or by the unique index on a concurrent insert.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(DbError::Duplicate(format!("User '{}' already exists", user.email)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, refresh_token_hash, created_at, updated_at)
            VALUES (?, ?, ?, NULL, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(format_timestamp(&now))
        .bind(format_timestamp(&now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, format!("User '{}' already exists", user.email)))?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email (exact, case-sensitive match)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, name, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, name, refresh_token_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Overwrite the refresh-token slot unconditionally (`None` clears it)
    pub async fn set_refresh_token_hash(
        &self,
        id: i64,
        token_hash: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(token_hash)
        .bind(format_timestamp(&now))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the refresh-token slot only if it still holds `expected`
    ///
    /// This is a single conditional UPDATE, so of several callers racing with
    /// the same `expected` value at most one observes `true`.
    pub async fn swap_refresh_token_hash(
        &self,
        id: i64,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = ?, updated_at = ?
            WHERE id = ? AND refresh_token_hash = ?
            "#,
        )
        .bind(replacement)
        .bind(format_timestamp(&now))
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
