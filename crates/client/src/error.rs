//! Errors raised while talking to the e-depot API.
//!
//! These never escape [`CompanyDirectory`](crate::CompanyDirectory): the
//! directory turns every failure into a degraded result. They are public so
//! the raw client can be used on its own.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when interacting with the e-depot API.
#[derive(Debug, Error)]
pub enum DepotApiError {
    /// HTTP request failed (connection error or timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream rejected the session token.
    #[error("Authentication rejected (HTTP {0})")]
    AuthExpired(StatusCode),

    /// Upstream answered with a non-success status unrelated to auth.
    #[error("HTTP {0}: {1}")]
    Status(StatusCode, String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No session token could be obtained.
    #[error("No access token - e-depot authentication required")]
    NoAccessToken,

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DepotApiError {
    /// Whether this error means the session token must be discarded.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_expired_display() {
        let err = DepotApiError::AuthExpired(StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Authentication rejected (HTTP 401 Unauthorized)");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_status_error_is_not_auth_failure() {
        let err = DepotApiError::Status(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: upstream down");
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_malformed_response_display() {
        let err = DepotApiError::MalformedResponse("missing data array".to_string());
        assert_eq!(err.to_string(), "Malformed response: missing data array");
    }
}
