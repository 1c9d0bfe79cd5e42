//! Configuration management for the Chirpy identity layer
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Settings are read once at startup and passed explicitly to every
//! component afterwards; nothing here is mutated at runtime.
//!
//! # Example
//!
//! ```no_run
//! use chirpy_identity::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("Session TTL: {}s", settings.jwt.expiry_seconds);
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use chrono::Duration;
use std::env;
use std::fmt;
use tracing::info;

use crate::error::IdentityError;
use crate::security::credentials::API_KEY_SCHEME;
use crate::security::refresh_token::REFRESH_TOKEN_EXPIRY_DAYS;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub refresh: RefreshTokenSettings,
    pub api_key: ApiKeySettings,
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// A `.env` file is consulted first in debug builds.
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            refresh: RefreshTokenSettings::from_env()?,
            api_key: ApiKeySettings::from_env()?,
        })
    }
}

/// Reads the first variable that is set, in order
fn var_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).or_else(|_| env::var(fallback)).ok()
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: var_with_fallback("DATABASE_URL", "DB_URL")
                .context("DATABASE_URL (or DB_URL) must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
        })
    }
}

/// Session token signing settings
#[derive(Clone)]
pub struct JwtSettings {
    /// Symmetric HS256 secret. May be empty.
    pub secret: String,
    pub expiry_seconds: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = var_with_fallback("JWT_SECRET", "SVR_SECRET")
            .context("JWT_SECRET (or SVR_SECRET) must be set")?;

        let settings = Self {
            secret,
            expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid JWT_EXPIRY_SECONDS")?,
        };
        settings.ttl().context("Invalid JWT_EXPIRY_SECONDS")?;

        Ok(settings)
    }

    /// Session token lifetime, or `Internal` if it does not fit a `Duration`
    pub fn ttl(&self) -> crate::error::Result<Duration> {
        Duration::try_seconds(self.expiry_seconds).ok_or_else(|| {
            IdentityError::Internal(format!(
                "Session token lifetime out of range: {}s",
                self.expiry_seconds
            ))
        })
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

/// Refresh token lifetime
#[derive(Debug, Clone)]
pub struct RefreshTokenSettings {
    pub expiry_days: i64,
}

impl RefreshTokenSettings {
    fn from_env() -> Result<Self> {
        let settings = Self {
            expiry_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .unwrap_or_else(|_| REFRESH_TOKEN_EXPIRY_DAYS.to_string())
                .parse()
                .context("Invalid REFRESH_TOKEN_EXPIRY_DAYS")?,
        };
        settings.ttl().context("Invalid REFRESH_TOKEN_EXPIRY_DAYS")?;

        Ok(settings)
    }

    pub fn ttl(&self) -> crate::error::Result<Duration> {
        Duration::try_days(self.expiry_days).ok_or_else(|| {
            IdentityError::Internal(format!(
                "Refresh token lifetime out of range: {} days",
                self.expiry_days
            ))
        })
    }
}

impl Default for RefreshTokenSettings {
    fn default() -> Self {
        Self {
            expiry_days: REFRESH_TOKEN_EXPIRY_DAYS,
        }
    }
}

/// Static shared API key for service-to-service webhooks
#[derive(Clone)]
pub struct ApiKeySettings {
    pub key: String,
    pub scheme: String,
}

impl ApiKeySettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            key: var_with_fallback("API_KEY", "POLKA_KEY")
                .context("API_KEY (or POLKA_KEY) must be set")?,
            scheme: env::var("API_KEY_SCHEME").unwrap_or_else(|_| API_KEY_SCHEME.to_string()),
        })
    }
}

impl fmt::Debug for ApiKeySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeySettings")
            .field("key", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_jwt_settings_from_env() {
        env::remove_var("SVR_SECRET");
        env::set_var("JWT_SECRET", "test-secret-key");
        env::set_var("JWT_EXPIRY_SECONDS", "7200");

        let settings = JwtSettings::from_env().unwrap();

        assert_eq!(settings.secret, "test-secret-key");
        assert_eq!(settings.ttl().unwrap(), Duration::hours(2));
        assert!(!format!("{:?}", settings).contains("test-secret-key"));

        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_EXPIRY_SECONDS");
    }

    #[test]
    #[serial]
    fn test_jwt_settings_out_of_range_expiry() {
        env::remove_var("SVR_SECRET");
        env::set_var("JWT_SECRET", "test-secret-key");
        env::set_var("JWT_EXPIRY_SECONDS", i64::MAX.to_string());

        assert!(JwtSettings::from_env().is_err());

        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_EXPIRY_SECONDS");
    }

    #[test]
    #[serial]
    fn test_jwt_settings_legacy_secret_and_defaults() {
        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_EXPIRY_SECONDS");
        env::set_var("SVR_SECRET", "legacy");

        let settings = JwtSettings::from_env().unwrap();

        assert_eq!(settings.secret, "legacy");
        assert_eq!(settings.expiry_seconds, 3600);

        env::remove_var("SVR_SECRET");
    }

    #[test]
    #[serial]
    fn test_jwt_settings_missing_secret() {
        env::remove_var("JWT_SECRET");
        env::remove_var("SVR_SECRET");

        assert!(JwtSettings::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_database_settings_from_env() {
        env::remove_var("DATABASE_URL");
        env::set_var("DB_URL", "postgres://localhost/chirpy");

        let settings = DatabaseSettings::from_env().unwrap();

        assert_eq!(settings.url, "postgres://localhost/chirpy");
        assert_eq!(settings.max_connections, 10); // Default

        env::remove_var("DB_URL");
    }

    #[test]
    #[serial]
    fn test_api_key_settings_from_env() {
        env::remove_var("API_KEY");
        env::remove_var("API_KEY_SCHEME");
        env::set_var("POLKA_KEY", "f271c81ff7084ee5b99a5091b42d486e");

        let settings = ApiKeySettings::from_env().unwrap();

        assert_eq!(settings.key, "f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(settings.scheme, "ApiKey");
        assert!(!format!("{:?}", settings).contains("f271c81f"));

        env::remove_var("POLKA_KEY");
    }

    #[test]
    #[serial]
    fn test_refresh_settings_default() {
        env::remove_var("REFRESH_TOKEN_EXPIRY_DAYS");

        let settings = RefreshTokenSettings::from_env().unwrap();

        assert_eq!(settings.ttl().unwrap(), Duration::days(60));
    }

    #[test]
    #[serial]
    fn test_refresh_settings_out_of_range_expiry() {
        env::set_var("REFRESH_TOKEN_EXPIRY_DAYS", i64::MAX.to_string());
        assert!(RefreshTokenSettings::from_env().is_err());

        env::remove_var("REFRESH_TOKEN_EXPIRY_DAYS");
    }
}
