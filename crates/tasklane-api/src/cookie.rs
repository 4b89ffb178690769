//! Refresh-token cookie handling

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

use crate::error::ApiError;
use crate::state::CookieSettings;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Read a cookie value from the request headers
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn build_cookie(
    value: &str,
    max_age_secs: i64,
    settings: &CookieSettings,
) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        REFRESH_COOKIE_NAME, value, max_age_secs
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))
}

/// `Set-Cookie` value carrying a refresh token
pub fn refresh_cookie(token: &str, settings: &CookieSettings) -> Result<HeaderValue, ApiError> {
    build_cookie(token, settings.max_age.num_seconds(), settings)
}

/// `Set-Cookie` value that removes the refresh token from the client
pub fn clear_refresh_cookie(settings: &CookieSettings) -> Result<HeaderValue, ApiError> {
    build_cookie("", 0, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; lang=en"),
        );

        assert_eq!(get_cookie(&headers, REFRESH_COOKIE_NAME).as_deref(), Some("abc.def.ghi"));
        assert_eq!(get_cookie(&headers, "lang").as_deref(), Some("en"));
        assert!(get_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("refreshToken="));
        assert!(get_cookie(&headers, REFRESH_COOKIE_NAME).is_none());
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let settings = CookieSettings::default();
        let cookie = refresh_cookie("tok", &settings).unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let secure = CookieSettings {
            secure: true,
            ..CookieSettings::default()
        };
        let cookie = clear_refresh_cookie(&secure).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));
    }
}
