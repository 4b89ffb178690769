//! Configuration loading and management

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tasklane_api::CookieSettings;
use tasklane_auth::TokenConfig;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_access_token_secret")]
    pub access_token_secret: String,
    #[serde(default = "default_refresh_token_secret")]
    pub refresh_token_secret: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    /// Mark the refresh cookie `Secure` (requires HTTPS in front of the server)
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: default_access_token_secret(),
            refresh_token_secret: default_refresh_token_secret(),
            access_token_ttl_minutes: default_access_token_ttl_minutes(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    /// Token codec settings derived from this section
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_token_secret.clone(),
            refresh_secret: self.refresh_token_secret.clone(),
            access_ttl: Duration::minutes(self.access_token_ttl_minutes),
            refresh_ttl: Duration::days(self.refresh_token_ttl_days),
        }
    }

    /// Refresh cookie attributes; the cookie lives as long as the refresh token
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.cookie_secure,
            max_age: Duration::days(self.refresh_token_ttl_days),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Browser origin allowed to call the API with credentials
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

/// Longest accepted access token lifetime (one day)
const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;
/// Longest accepted refresh token lifetime (one year)
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "./data/tasklane.db".to_string()
}

fn default_access_token_secret() -> String {
    "change-me-access-secret".to_string()
}

fn default_refresh_token_secret() -> String {
    "change-me-refresh-secret".to_string()
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    7
}

fn default_allowed_origin() -> String {
    "http://localhost:3001".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Apply secrets supplied through the environment
    pub fn override_secrets(&mut self, access: Option<String>, refresh: Option<String>) {
        if let Some(secret) = access {
            self.auth.access_token_secret = secret;
        }
        if let Some(secret) = refresh {
            self.auth.refresh_token_secret = secret;
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;

        if auth.access_token_secret.is_empty() || auth.refresh_token_secret.is_empty() {
            anyhow::bail!("Token secrets must not be empty");
        }
        if auth.access_token_secret == auth.refresh_token_secret {
            anyhow::bail!("Access and refresh token secrets must differ");
        }
        if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&auth.access_token_ttl_minutes) {
            anyhow::bail!(
                "access_token_ttl_minutes must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_MINUTES
            );
        }
        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&auth.refresh_token_ttl_days) {
            anyhow::bail!(
                "refresh_token_ttl_days must be between 1 and {}",
                MAX_REFRESH_TOKEN_TTL_DAYS
            );
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "Unknown logging format '{}', expected 'pretty' or 'json'",
                self.logging.format
            );
        }

        Ok(())
    }

    /// Log a warning for every development default still in place
    pub fn warn_insecure_defaults(&self) {
        if self.auth.access_token_secret == default_access_token_secret() {
            warn!("Using the default access token secret; set TASKLANE_ACCESS_TOKEN_SECRET");
        }
        if self.auth.refresh_token_secret == default_refresh_token_secret() {
            warn!("Using the default refresh token secret; set TASKLANE_REFRESH_TOKEN_SECRET");
        }
        if !self.auth.cookie_secure {
            warn!("Refresh cookie is not marked Secure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cors.allowed_origin, "http://localhost:3001");
        assert_eq!(config.auth.token_config().access_ttl, Duration::minutes(15));
        assert_eq!(config.auth.cookie_settings().max_age, Duration::days(7));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/tasklane.toml").unwrap();
        assert_eq!(config.database.path, default_db_path());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[auth]
access_token_secret = "a-secret"
refresh_token_secret = "r-secret"
refresh_token_ttl_days = 30

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.auth.access_token_ttl_minutes, 15);
        assert_eq!(config.auth.cookie_settings().max_age, Duration::days(30));
        assert_eq!(config.logging.format, "json");
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let mut config = Config::default();
        config.override_secrets(Some("same".to_string()), Some("same".to_string()));
        assert!(config.validate().is_err());

        config.override_secrets(None, Some("different".to_string()));
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.access_token_secret, "same");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.auth.access_token_ttl_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.access_token_ttl_minutes = MAX_ACCESS_TOKEN_TTL_MINUTES + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.refresh_token_ttl_days = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.access_token_ttl_minutes = MAX_ACCESS_TOKEN_TTL_MINUTES;
        config.auth.refresh_token_ttl_days = MAX_REFRESH_TOKEN_TTL_DAYS;
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.token_config().refresh_ttl, Duration::days(365));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.refresh_token_secret = String::new();
        assert!(config.validate().is_err());
    }
}
