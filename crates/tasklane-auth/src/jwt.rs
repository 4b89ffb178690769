//! JWT token management
//!
//! Access and refresh tokens are both HS256 JWTs, but each kind has its own
//! secret and lifetime. A leaked access-token secret therefore cannot be used
//! to mint refresh tokens, and a token of one kind never verifies as the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

/// Token kind, embedded in the claims as `typ`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token ID, so two tokens minted in the same second still differ
    pub jti: String,
    /// Token kind
    pub typ: TokenKind,
}

/// Secrets and lifetimes for both token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-access-secret".to_string(),
            refresh_secret: "change-me-refresh-secret".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and verifies access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenCodec {
    /// Create a new token codec
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: SigningKeys::new(&config.access_secret, config.access_ttl),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    /// Issue a short-lived access token
    pub fn issue_access(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_at(TokenKind::Access, user_id, Utc::now())
    }

    /// Issue a long-lived refresh token
    pub fn issue_refresh(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_at(TokenKind::Refresh, user_id, Utc::now())
    }

    /// Verify an access token and return its subject
    pub fn verify_access(&self, token: &str) -> Result<i64, AuthError> {
        self.verify_at(TokenKind::Access, token, Utc::now())
    }

    /// Verify a refresh token's signature and expiry and return its subject
    ///
    /// This does not check the token against the identity store.
    pub fn verify_refresh(&self, token: &str) -> Result<i64, AuthError> {
        self.verify_at(TokenKind::Refresh, token, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        kind: TokenKind,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let keys = self.keys(kind);
        let exp = now + keys.ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
        };

        debug!("Generating {:?} token for user: {}", kind, user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(AuthError::Jwt)
    }

    /// Verify a token as if the current time were `now`
    ///
    /// A token is valid strictly before its `exp`; at `exp` it is expired.
    pub fn verify_at(
        &self,
        kind: TokenKind,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, AuthError> {
        let token_data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(classify_decode_error)?;
        let claims = token_data.claims;

        if claims.typ != kind {
            return Err(AuthError::TokenInvalid);
        }

        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        claims.sub.parse().map_err(|_| AuthError::TokenInvalid)
    }
}

fn classify_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => AuthError::TokenMalformed,
        _ => AuthError::TokenInvalid,
    }
}
