//! Identity store seam
//!
//! The session manager only needs find/create/update-by-key operations on
//! user records. They are expressed as a trait so the manager can be built
//! over any backend; the SQLite `Database` is the production implementation.

use async_trait::async_trait;
use tasklane_db::{Database, DbError, NewUser, User};

use crate::error::AuthError;

/// Persistence operations required by the session manager
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a user by exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Create a user, failing with `AuthError::AlreadyExists` on a taken email
    async fn create_user(&self, user: NewUser) -> Result<User, AuthError>;

    /// Overwrite the refresh-token slot (`None` clears it)
    async fn set_refresh_token(&self, user_id: i64, token_hash: Option<&str>)
    -> Result<(), AuthError>;

    /// Atomically replace the refresh-token slot if it still holds `expected`
    async fn rotate_refresh_token(
        &self,
        user_id: i64,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AuthError>;
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.get_user_by_email(email).await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AuthError> {
        match self.insert_user(user).await {
            Ok(user) => Ok(user),
            Err(DbError::Duplicate(_)) => Err(AuthError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_refresh_token(
        &self,
        user_id: i64,
        token_hash: Option<&str>,
    ) -> Result<(), AuthError> {
        self.set_refresh_token_hash(user_id, token_hash).await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: i64,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        Ok(self.swap_refresh_token_hash(user_id, expected, replacement).await?)
    }
}
