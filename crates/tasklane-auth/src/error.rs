//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Identity store error: {0}")]
    Store(String),
}

impl From<tasklane_db::DbError> for AuthError {
    fn from(err: tasklane_db::DbError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl AuthError {
    /// Transport status and client-facing message
    ///
    /// Token failures all surface as the same 401 so clients cannot tell an
    /// expired token from a forged one.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::AlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, "Invalid refresh token"),
            AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::TokenInvalid
            | AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::PasswordHash(_) | AuthError::Jwt(_) | AuthError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("Authentication failure: {}", self);
        }

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_collapse_to_unauthorized() {
        for err in [
            AuthError::TokenExpired,
            AuthError::TokenMalformed,
            AuthError::TokenInvalid,
            AuthError::Unauthorized,
        ] {
            assert_eq!(err.status_and_message(), (StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AuthError::Store("disk I/O error at /var/lib/tasklane.db".to_string());
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("disk"));
    }
}
