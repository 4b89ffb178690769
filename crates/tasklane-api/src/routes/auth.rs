//! Authentication routes

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use tasklane_auth::TokenKind;
use tracing::{debug, info};

use crate::cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
use crate::error::ApiError;
use crate::extract::{AppJson, RequireAuth};
use crate::state::AppState;

use super::types::{
    LoginRequest, MessageResponse, RefreshResponse, RegisterRequest, SessionResponse,
};

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length for new accounts
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed display name length
const MAX_NAME_LENGTH: usize = 100;

/// Validate email shape: one `@`, non-empty local part, dotted domain
fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation("Email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::Validation(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str, min_length: usize) -> Result<(), ApiError> {
    if password.len() < min_length {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters long",
            min_length
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validate and normalize a display name
fn validate_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::Validation(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name)
}

// ==================== Auth Routes ====================

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password, MIN_PASSWORD_LENGTH)?;
    let name = validate_name(&request.name)?;

    let session = state
        .sessions
        .register(&request.email, &request.password, name)
        .await?;

    metrics::counter!("tasklane_auth_registrations_total").increment(1);

    let cookie = refresh_cookie(&session.tokens.refresh_token, &state.cookies)?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(SessionResponse {
            message: "User registered successfully",
            user: session.user,
            access_token: session.tokens.access_token,
            expires_in: state.tokens.ttl(TokenKind::Access).num_seconds(),
        }),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password, 1)?;

    let session = match state.sessions.login(&request.email, &request.password).await {
        Ok(session) => session,
        Err(e) => {
            metrics::counter!("tasklane_auth_logins_total", "result" => "failure").increment(1);
            return Err(e.into());
        }
    };

    metrics::counter!("tasklane_auth_logins_total", "result" => "success").increment(1);

    let cookie = refresh_cookie(&session.tokens.refresh_token, &state.cookies)?;

    Ok((
        [(SET_COOKIE, cookie)],
        Json(SessionResponse {
            message: "Login successful",
            user: session.user,
            access_token: session.tokens.access_token,
            expires_in: state.tokens.ttl(TokenKind::Access).num_seconds(),
        }),
    ))
}

/// POST /auth/refresh
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(|| {
        debug!("Refresh attempted without a refresh cookie");
        ApiError::Unauthorized
    })?;

    let tokens = match state.sessions.refresh(&presented).await {
        Ok(tokens) => tokens,
        Err(e) => {
            metrics::counter!("tasklane_auth_refreshes_total", "result" => "failure").increment(1);
            return Err(e.into());
        }
    };

    metrics::counter!("tasklane_auth_refreshes_total", "result" => "success").increment(1);

    let cookie = refresh_cookie(&tokens.refresh_token, &state.cookies)?;

    Ok((
        [(SET_COOKIE, cookie)],
        Json(RefreshResponse {
            message: "Token refreshed",
            access_token: tokens.access_token,
            expires_in: state.tokens.ttl(TokenKind::Access).num_seconds(),
        }),
    ))
}

/// POST /auth/logout (authenticated)
async fn logout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.logout(user.id).await?;

    info!("Session closed for user {}", user.id);

    let cookie = clear_refresh_cookie(&state.cookies)?;

    Ok((
        [(SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

/// Routes that establish a session
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes that require an access token
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());

        let rejected = [
            "", "ax.com", "@x.com", "a@", "a@x", "a@.com", "a@x.", "a@b@x.com", "a b@x.com",
        ];
        for bad in rejected {
            assert!(validate_email(bad).is_err(), "{} should be rejected", bad);
        }

        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("pw123456", MIN_PASSWORD_LENGTH).is_ok());
        assert!(validate_password("short", MIN_PASSWORD_LENGTH).is_err());
        assert!(validate_password("x", 1).is_ok());
        assert!(validate_password("", 1).is_err());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1), 1).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ann  ").unwrap(), "Ann");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
