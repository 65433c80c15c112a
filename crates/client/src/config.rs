//! E-Depot client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EDEPOT_API_BASE_URL` - Base URL of the upstream e-depot API
//!
//! ## Optional
//! - `EDEPOT_APP_VERSION` - App version sent with token requests (default: 1.0.0)
//! - `EDEPOT_TOKEN_PATH` - Token endpoint path (default: /api/data/util/gettokenNonAuth)
//! - `EDEPOT_ACCOUNT_REPORT` - Account listing report name (default: `CMS_TaiKhoan_ThongTin`)
//! - `EDEPOT_DRIVER_REPORT` - Driver listing report name (default: `DM_TaiXe_DanhSach`)
//! - `EDEPOT_TOKEN_TIMEOUT_SECS` - Token request timeout (default: 10)
//! - `EDEPOT_REQUEST_TIMEOUT_SECS` - Data request timeout (default: 30)
//! - `EDEPOT_CACHE_TTL_SECS` - Company cache lifetime (default: 600)
//! - `EDEPOT_COMPANY_NAME_PREFIX` - Label used for unnamed companies (default: Company)

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_APP_VERSION: &str = "1.0.0";
pub const DEFAULT_TOKEN_PATH: &str = "/api/data/util/gettokenNonAuth";
pub const DEFAULT_ACCOUNT_REPORT: &str = "CMS_TaiKhoan_ThongTin";
pub const DEFAULT_DRIVER_REPORT: &str = "DM_TaiXe_DanhSach";
pub const DEFAULT_COMPANY_NAME_PREFIX: &str = "Company";

const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Upstream API and cache configuration.
#[derive(Debug, Clone)]
pub struct EDepotConfig {
    /// Base URL of the upstream API
    pub base_url: Url,
    /// App version sent in the default token payload
    pub app_version: String,
    /// Path of the token endpoint, relative to `base_url`
    pub token_path: String,
    /// Report listing account/profile records (primary company source)
    pub account_report: String,
    /// Report listing drivers (fallback company source)
    pub driver_report: String,
    /// Timeout for token requests
    pub token_timeout: Duration,
    /// Timeout for data requests
    pub request_timeout: Duration,
    /// How long a fetched company list stays fresh
    pub cache_ttl: Duration,
    /// Prefix for synthesized company names
    pub company_name_prefix: String,
}

impl EDepotConfig {
    /// Create a configuration with default settings for the given base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            app_version: DEFAULT_APP_VERSION.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            account_report: DEFAULT_ACCOUNT_REPORT.to_string(),
            driver_report: DEFAULT_DRIVER_REPORT.to_string(),
            token_timeout: Duration::from_secs(DEFAULT_TOKEN_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            company_name_prefix: DEFAULT_COMPANY_NAME_PREFIX.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("EDEPOT_API_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("EDEPOT_API_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            app_version: get_env_or_default("EDEPOT_APP_VERSION", DEFAULT_APP_VERSION),
            token_path: get_env_or_default("EDEPOT_TOKEN_PATH", DEFAULT_TOKEN_PATH),
            account_report: get_env_or_default("EDEPOT_ACCOUNT_REPORT", DEFAULT_ACCOUNT_REPORT),
            driver_report: get_env_or_default("EDEPOT_DRIVER_REPORT", DEFAULT_DRIVER_REPORT),
            token_timeout: get_secs_or_default(
                "EDEPOT_TOKEN_TIMEOUT_SECS",
                DEFAULT_TOKEN_TIMEOUT_SECS,
            )?,
            request_timeout: get_secs_or_default(
                "EDEPOT_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            cache_ttl: get_secs_or_default("EDEPOT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            company_name_prefix: get_env_or_default(
                "EDEPOT_COMPANY_NAME_PREFIX",
                DEFAULT_COMPANY_NAME_PREFIX,
            ),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a duration in whole seconds with a default value.
fn get_secs_or_default(key: &str, default: u64) -> Result<Duration, ConfigError> {
    std::env::var(key).map_or(Ok(Duration::from_secs(default)), |value| {
        parse_secs(key, &value)
    })
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = EDepotConfig::new(Url::parse("https://edepot.example.vn").unwrap());
        assert_eq!(config.app_version, "1.0.0");
        assert_eq!(config.token_path, DEFAULT_TOKEN_PATH);
        assert_eq!(config.account_report, DEFAULT_ACCOUNT_REPORT);
        assert_eq!(config.driver_report, DEFAULT_DRIVER_REPORT);
        assert_eq!(config.token_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_parse_secs_valid() {
        assert_eq!(parse_secs("K", " 45 ").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn test_parse_secs_invalid() {
        let err = parse_secs("EDEPOT_CACHE_TTL_SECS", "ten").unwrap_err();
        assert!(err.to_string().starts_with("Invalid environment variable EDEPOT_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_missing_env_error_display() {
        let err = ConfigError::MissingEnvVar("EDEPOT_API_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: EDEPOT_API_BASE_URL"
        );
    }
}
