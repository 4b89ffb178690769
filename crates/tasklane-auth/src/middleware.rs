//! Authentication middleware for Axum

use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::TokenCodec;

/// Authenticated user information
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthorized)
}

/// Verify the bearer access token in `headers`
///
/// Every failure is reported as `AuthError::Unauthorized`. The identity store
/// is never consulted; access tokens are checked by signature and expiry only.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenCodec) -> Result<AuthUser, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthorized)?;

    let token = extract_bearer_token(header)?;

    let id = tokens.verify_access(token).map_err(|e| {
        debug!("Access token rejected: {}", e);
        AuthError::Unauthorized
    })?;

    Ok(AuthUser { id })
}

/// Authentication middleware
///
/// Rejects requests without a valid access token and adds the `AuthUser` to
/// request extensions for downstream handlers.
pub async fn auth_middleware<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    Arc<TokenCodec>: FromRef<S>,
    S: Clone + Send + Sync,
{
    let tokens = Arc::<TokenCodec>::from_ref(&state);
    let user = authenticate(request.headers(), &tokens)?;

    debug!("Authenticated user: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{TokenConfig, TokenKind};
    use axum::{
        Extension, Router,
        body::Body,
        http::{HeaderValue, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&TokenConfig::default()))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_accepts_bearer_access_token() {
        let tokens = codec();
        let token = tokens.issue_access(5).unwrap();

        let user = authenticate(&headers_with(&format!("Bearer {}", token)), &tokens).unwrap();
        assert_eq!(user, AuthUser { id: 5 });
    }

    #[test]
    fn test_authenticate_rejects_everything_else_uniformly() {
        let tokens = codec();
        let refresh = tokens.issue_refresh(5).unwrap();
        let expired = tokens
            .issue_at(TokenKind::Access, 5, Utc::now() - Duration::hours(2))
            .unwrap();
        let valid = tokens.issue_access(5).unwrap();

        let cases = [
            HeaderMap::new(),
            headers_with(&format!("Basic {}", valid)),
            headers_with("Bearer "),
            headers_with("Bearer garbage"),
            headers_with(&format!("Bearer {}", refresh)),
            headers_with(&format!("Bearer {}", expired)),
        ];

        for headers in cases {
            let err = authenticate(&headers, &tokens).unwrap_err();
            assert!(matches!(err, AuthError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn test_middleware_attaches_identity() {
        let tokens = codec();
        let app = Router::new()
            .route(
                "/me",
                get(|Extension(user): Extension<AuthUser>| async move { user.id.to_string() }),
            )
            .route_layer(from_fn_with_state(tokens.clone(), auth_middleware::<Arc<TokenCodec>>));

        let token = tokens.issue_access(9).unwrap();
        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/me")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"9");

        let response = app
            .oneshot(HttpRequest::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
