//! E-Depot REST API client.
//!
//! Wraps the two upstream endpoints the dashboard consumes: the token
//! endpoint and the report-processing endpoint. Holds the current session
//! and transparently re-authenticates once when a data call is rejected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use super::DepotApiError;
use super::auth::{AuthSession, default_token_payload, request_token};
use super::config::EDepotConfig;

/// Upstream path prefix for report processing.
const PROCESS_PATH: &str = "api/data/process/";

/// Extra attempts allowed after an authentication failure.
const MAX_AUTH_RETRIES: usize = 1;

/// A single upstream record, as returned in a report's `data` array.
pub type Record = Map<String, Value>;

/// E-Depot API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
///
/// # Authentication
///
/// A token is acquired lazily before the first data call and kept in memory.
/// A 401/403 from a data call discards it; the call is retried once with a
/// freshly acquired token.
#[derive(Clone)]
pub struct EDepotClient {
    inner: Arc<EDepotClientInner>,
}

struct EDepotClientInner {
    client: reqwest::Client,
    config: EDepotConfig,
    /// In-memory session cache
    session: RwLock<Option<AuthSession>>,
}

/// Request body for the report endpoint.
#[derive(Serialize)]
struct ReportRequest<'a> {
    reqid: &'a str,
    token: &'a str,
    reqtime: &'a Value,
    data: &'a Value,
}

/// Response from the report endpoint.
#[derive(Deserialize)]
struct ReportResponse {
    #[serde(default)]
    data: Option<Value>,
}

impl EDepotClient {
    /// Create a new client without a session.
    ///
    /// # Errors
    ///
    /// Returns `DepotApiError::Http` if the HTTP client cannot be created.
    pub fn new(config: &EDepotConfig) -> Result<Self, DepotApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(EDepotClientInner {
                client,
                config: config.clone(),
                session: RwLock::new(None),
            }),
        })
    }

    /// Configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &EDepotConfig {
        &self.inner.config
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Acquire a session token for `purpose`.
    ///
    /// `purpose` defaults to the driver listing report and `payload` to
    /// `{ "appVersion": <configured version> }`. Returns `true` and stores the
    /// session on success. On any failure returns `false` and leaves the
    /// currently held session untouched.
    #[instrument(skip(self, payload))]
    pub async fn acquire_token(&self, purpose: Option<&str>, payload: Option<Value>) -> bool {
        let config = &self.inner.config;
        let purpose = purpose.unwrap_or(&config.driver_report);
        let payload = payload.unwrap_or_else(|| default_token_payload(&config.app_version));

        let endpoint = match self.endpoint(&config.token_path) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "Invalid token endpoint");
                return false;
            }
        };

        match request_token(
            &self.inner.client,
            endpoint,
            purpose,
            &payload,
            config.token_timeout,
        )
        .await
        {
            Ok(session) => {
                *self.inner.session.write().await = Some(session);
                debug!("Acquired e-depot session token");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to acquire e-depot session token");
                false
            }
        }
    }

    /// Get the current session (if set).
    pub async fn session(&self) -> Option<AuthSession> {
        self.inner.session.read().await.clone()
    }

    /// Check whether a session token is held.
    pub async fn has_session(&self) -> bool {
        self.inner.session.read().await.is_some()
    }

    /// Set the session directly.
    pub async fn set_session(&self, session: AuthSession) {
        *self.inner.session.write().await = Some(session);
    }

    /// Clear the cached session.
    pub async fn clear_session(&self) {
        *self.inner.session.write().await = None;
    }

    /// Return the held session, acquiring one for `purpose` if none is held.
    async fn ensure_session(&self, purpose: &str) -> Result<AuthSession, DepotApiError> {
        if let Some(session) = self.session().await {
            return Ok(session);
        }

        if !self.acquire_token(Some(purpose), None).await {
            return Err(DepotApiError::NoAccessToken);
        }

        self.session().await.ok_or(DepotApiError::NoAccessToken)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Run an upstream report and return its records.
    ///
    /// The report name doubles as the token purpose. An authentication
    /// failure clears the session; the call is then retried exactly once.
    ///
    /// # Errors
    ///
    /// Returns `DepotApiError::AuthExpired` if the retry is rejected too,
    /// `DepotApiError::NoAccessToken` if no token could be acquired, and any
    /// transport or parse error from the last attempt.
    #[instrument(skip(self, data))]
    pub async fn fetch_report(
        &self,
        report: &str,
        data: &Value,
    ) -> Result<Vec<Record>, DepotApiError> {
        let mut last_error = DepotApiError::NoAccessToken;

        for attempt in 0..=MAX_AUTH_RETRIES {
            let session = self.ensure_session(report).await?;

            match self.post_report(report, &session, data).await {
                Err(e) if e.is_auth_failure() => {
                    self.clear_session().await;
                    if attempt < MAX_AUTH_RETRIES {
                        warn!(error = %e, "Session rejected, re-authenticating");
                    }
                    last_error = e;
                }
                result => return result,
            }
        }

        Err(last_error)
    }

    /// Post a single report request with the given session.
    async fn post_report(
        &self,
        report: &str,
        session: &AuthSession,
        data: &Value,
    ) -> Result<Vec<Record>, DepotApiError> {
        let endpoint = self.endpoint(&format!("{PROCESS_PATH}{report}"))?;

        let response = self
            .inner
            .client
            .post(endpoint)
            .json(&ReportRequest {
                reqid: report,
                token: session.token(),
                reqtime: &session.issued_at_ref,
                data,
            })
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DepotApiError::AuthExpired(status));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "E-depot API returned non-success status"
            );
            return Err(DepotApiError::Status(
                status,
                response_text.chars().take(200).collect(),
            ));
        }

        parse_report_response(&response_text).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse e-depot report response"
            );
        })
    }

    /// Resolve a path against the configured base URL.
    fn endpoint(&self, path: &str) -> Result<Url, DepotApiError> {
        let mut base = self.inner.config.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

/// Extract the record list from a report response body.
///
/// Non-object entries in the `data` array are skipped.
fn parse_report_response(body: &str) -> Result<Vec<Record>, DepotApiError> {
    let response: ReportResponse = serde_json::from_str(body)?;

    match response.data {
        Some(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        Some(_) => Err(DepotApiError::MalformedResponse(
            "data is not an array".to_string(),
        )),
        None => Err(DepotApiError::MalformedResponse(
            "missing data array".to_string(),
        )),
    }
}
