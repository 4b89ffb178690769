//! API error types

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tasklane_auth::AuthError;
use tasklane_db::DbError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            ApiError::Auth(e) => {
                let (status, message) = e.status_and_message();
                (status, message.to_string())
            }
            ApiError::Database(e) => match e {
                DbError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                DbError::Duplicate(_) => (StatusCode::CONFLICT, "Already exists".to_string()),
                DbError::Connection(_) | DbError::Migration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Details stay in the logs, clients only see the generic message
        if status.is_server_error() {
            error!("Request failed: {}", self);
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
    fn test_status_mapping() {
        let cases = [
            (ApiError::NotFound("Task not found".into()), StatusCode::NOT_FOUND),
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Auth(AuthError::AlreadyExists), StatusCode::CONFLICT),
            (ApiError::Auth(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError::Auth(AuthError::InvalidRefreshToken), StatusCode::UNAUTHORIZED),
            (ApiError::Auth(AuthError::TokenExpired), StatusCode::UNAUTHORIZED),
            (ApiError::Database(DbError::Duplicate("x".into())), StatusCode::CONFLICT),
            (
                ApiError::Database(DbError::Migration("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_and_message().0, expected, "{}", err);
        }
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = ApiError::Internal("SELECT * FROM users failed".into());
        let (_, message) = err.status_and_message();
        assert_eq!(message, INTERNAL_MESSAGE);
    }
}
