//! Session management
//!
//! Each user is either without a session (no stored refresh token) or has
//! exactly one active session, identified by the single refresh token whose
//! fingerprint is stored on the user record. Login overwrites it, refresh
//! rotates it, logout clears it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tasklane_db::{NewUser, User};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::TokenCodec;
use crate::password::{dummy_hash, hash_password_async, verify_password_async};
use crate::store::IdentityStore;

/// User fields that are safe to return to clients
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Fingerprint stored in place of the raw refresh token
pub fn fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Orchestrates register, login, refresh and logout
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn IdentityStore>,
    tokens: Arc<TokenCodec>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn IdentityStore>, tokens: Arc<TokenCodec>) -> Self {
        Self { store, tokens }
    }

    /// Create an account and open its first session
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            debug!("Registration rejected, email already in use");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = hash_password_async(password.to_string()).await?;

        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
            })
            .await?;

        let tokens = self.open_session(user.id).await?;

        info!("Registered user {}", user.id);

        Ok(AuthSession {
            user: PublicUser::from(&user),
            tokens,
        })
    }

    /// Check credentials and open a new session, replacing any previous one
    ///
    /// An unknown email and a wrong password produce the same error, and both
    /// paths run a full password verification.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self.store.find_by_email(email).await?;

        let hash_to_verify = match &user {
            Some(u) => u.password_hash.clone(),
            None => dummy_hash().to_string(),
        };
        let password_valid = verify_password_async(password.to_string(), hash_to_verify).await;

        let user = match (user, password_valid) {
            (Some(u), Ok(true)) => u,
            (Some(u), Err(e)) => {
                warn!("Password verification failed for user {}: {}", u.id, e);
                return Err(e);
            }
            _ => {
                debug!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let tokens = self.open_session(user.id).await?;

        info!("User {} logged in", user.id);

        Ok(AuthSession {
            user: PublicUser::from(&user),
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair, invalidating the presented one
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.tokens.verify_refresh(presented).map_err(|e| {
            debug!("Refresh token rejected: {}", e);
            AuthError::InvalidRefreshToken
        })?;

        let tokens = self.issue_pair(user_id)?;

        let rotated = self
            .store
            .rotate_refresh_token(
                user_id,
                &fingerprint(presented),
                &fingerprint(&tokens.refresh_token),
            )
            .await?;

        if !rotated {
            // Superseded, logged out, or replayed after rotation
            warn!("Stale refresh token presented for user {}", user_id);
            return Err(AuthError::InvalidRefreshToken);
        }

        debug!("Rotated refresh token for user {}", user_id);
        Ok(tokens)
    }

    /// End the user's session; a no-op when none is active
    pub async fn logout(&self, user_id: i64) -> Result<(), AuthError> {
        self.store.set_refresh_token(user_id, None).await?;
        info!("User {} logged out", user_id);
        Ok(())
    }

    fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user_id)?,
            refresh_token: self.tokens.issue_refresh(user_id)?,
        })
    }

    async fn open_session(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let tokens = self.issue_pair(user_id)?;
        self.store
            .set_refresh_token(user_id, Some(&fingerprint(&tokens.refresh_token)))
            .await?;
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{TokenConfig, TokenKind};
    use chrono::Duration;
    use tasklane_db::Database;

    async fn setup() -> (SessionManager, Database, Arc<TokenCodec>) {
        let db = Database::in_memory().await.unwrap();
        let tokens = Arc::new(TokenCodec::new(&TokenConfig::default()));
        let sessions = SessionManager::new(Arc::new(db.clone()), tokens.clone());
        (sessions, db, tokens)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (sessions, _, tokens) = setup().await;

        let registered = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();
        assert_eq!(registered.user.email, "a@x.com");
        assert_eq!(registered.user.name, "Ann");

        let session = sessions.login("a@x.com", "pw123456").await.unwrap();
        assert_eq!(session.user.id, registered.user.id);
        assert_eq!(tokens.verify_access(&session.tokens.access_token).unwrap(), registered.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (sessions, db, _) = setup().await;

        let first = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();
        let before = db.get_user_by_id(first.user.id).await.unwrap().unwrap();

        let err = sessions.register("a@x.com", "other-password", "Impostor").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));

        let after = db.get_user_by_id(first.user.id).await.unwrap().unwrap();
        assert_eq!(after.name, "Ann");
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.refresh_token_hash, before.refresh_token_hash);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (sessions, _, _) = setup().await;
        sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        let wrong_password = sessions.login("a@x.com", "wrong").await.unwrap_err();
        let unknown_user = sessions.login("nobody@x.com", "pw123456").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let (sessions, _, _) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();
        let original = session.tokens.refresh_token;

        let rotated = sessions.refresh(&original).await.unwrap();
        assert_ne!(rotated.refresh_token, original);

        let replay = sessions.refresh(&original).await.unwrap_err();
        assert!(matches!(replay, AuthError::InvalidRefreshToken));

        // The rotated token remains usable exactly once
        sessions.refresh(&rotated.refresh_token).await.unwrap();
        assert!(sessions.refresh(&rotated.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_login_supersedes_previous_refresh_token() {
        let (sessions, _, _) = setup().await;
        let registered = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        let wrong = sessions.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));

        let session = sessions.login("a@x.com", "pw123456").await.unwrap();

        let stale = sessions.refresh(&registered.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(stale, AuthError::InvalidRefreshToken));

        sessions.refresh(&session.tokens.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_invalidates_refresh_token() {
        let (sessions, db, _) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        sessions.logout(session.user.id).await.unwrap();
        let stored = db.get_user_by_id(session.user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_none());

        let err = sessions.refresh(&session.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        // Logging out twice is fine
        sessions.logout(session.user.id).await.unwrap();

        let fresh = sessions.login("a@x.com", "pw123456").await.unwrap();
        sessions.refresh(&fresh.tokens.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_refresh_token_rejected() {
        let (sessions, _, tokens) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        let expired = tokens
            .issue_at(TokenKind::Refresh, session.user.id, Utc::now() - Duration::days(8))
            .unwrap();
        let err = sessions.refresh(&expired).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        // A rejected token leaves the active session untouched
        sessions.refresh(&session.tokens.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_non_refresh_tokens() {
        let (sessions, _, _) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        for bogus in [session.tokens.access_token.as_str(), "garbage", ""] {
            let err = sessions.refresh(bogus).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidRefreshToken));
        }
    }

    #[tokio::test]
    async fn test_refresh_token_stored_as_fingerprint() {
        let (sessions, db, _) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();

        let stored = db.get_user_by_id(session.user.id).await.unwrap().unwrap();
        let stored_hash = stored.refresh_token_hash.unwrap();
        assert_ne!(stored_hash, session.tokens.refresh_token);
        assert_eq!(stored_hash, fingerprint(&session.tokens.refresh_token));
        assert_eq!(stored_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_single_winner() {
        let (sessions, _, _) = setup().await;
        let session = sessions.register("a@x.com", "pw123456", "Ann").await.unwrap();
        let token = session.tokens.refresh_token;

        let (first, second) = tokio::join!(sessions.refresh(&token), sessions.refresh(&token));

        let successes = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
    }
}
