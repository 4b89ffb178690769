//! Request extractors that report failures in the API error format

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use tasklane_auth::AuthUser;

use crate::error::ApiError;

/// JSON body extractor; malformed bodies become 400 validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string extractor; malformed queries become 400 validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Path extractor; unparsable segments become 400 validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Identity attached by the authentication middleware
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .map(RequireAuth)
            .ok_or(ApiError::Unauthorized)
    }
}
