//! E-Depot token acquisition.
//!
//! The upstream hands out short-lived tokens per request purpose (`reqid`).
//! Each token comes with a `reqtime` marker that must be echoed back on
//! every data call made with it.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::DepotApiError;

/// Session obtained from the token endpoint.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token for data calls.
    pub token: SecretString,
    /// Opaque session marker (`reqtime`) returned alongside the token.
    pub issued_at_ref: Value,
}

impl AuthSession {
    /// Expose the token for building a request body.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

/// Request body for the token endpoint.
#[derive(Serialize)]
struct TokenRequest<'a> {
    reqid: &'a str,
    data: &'a Value,
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    reqtime: Option<Value>,
}

/// Default payload sent with token requests.
#[must_use]
pub fn default_token_payload(app_version: &str) -> Value {
    serde_json::json!({ "appVersion": app_version })
}

/// Request a new session token for the given purpose.
///
/// # Errors
///
/// Returns `DepotApiError::Http` on network failure or timeout,
/// `DepotApiError::Status` on a non-success status, and
/// `DepotApiError::MalformedResponse` if the token or marker is missing.
#[instrument(skip(client, endpoint, payload), fields(purpose = %purpose))]
pub async fn request_token(
    client: &reqwest::Client,
    endpoint: url::Url,
    purpose: &str,
    payload: &Value,
    timeout: Duration,
) -> Result<AuthSession, DepotApiError> {
    let response = client
        .post(endpoint)
        .timeout(timeout)
        .json(&TokenRequest {
            reqid: purpose,
            data: payload,
        })
        .send()
        .await?;

    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        return Err(DepotApiError::Status(
            status,
            error_text.chars().take(200).collect(),
        ));
    }

    let body = response.text().await?;
    parse_token_response(&body)
}

/// Parse a token endpoint body into a session.
fn parse_token_response(body: &str) -> Result<AuthSession, DepotApiError> {
    let response: TokenResponse = serde_json::from_str(body)?;

    let token = response
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DepotApiError::MalformedResponse("token missing".to_string()))?;

    let issued_at_ref = response
        .reqtime
        .filter(|r| !r.is_null())
        .ok_or_else(|| DepotApiError::MalformedResponse("reqtime missing".to_string()))?;

    Ok(AuthSession {
        token: SecretString::from(token),
        issued_at_ref,
    })
}
