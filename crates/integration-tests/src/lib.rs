//! Integration test support for the E-Depot company directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p edepot-integration-tests
//! ```
//!
//! Tests run against a `wiremock` server standing in for the upstream
//! e-depot API, with a manually driven clock for cache expiry.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use edepot_client::config::{DEFAULT_ACCOUNT_REPORT, DEFAULT_DRIVER_REPORT, DEFAULT_TOKEN_PATH};
use edepot_client::{CachePolicy, Clock, CompanyDirectory, EDepotClient, EDepotConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token path served by the mock upstream.
pub const TOKEN_PATH: &str = DEFAULT_TOKEN_PATH;

/// Path of the account listing report.
#[must_use]
pub fn account_report_path() -> String {
    format!("/api/data/process/{DEFAULT_ACCOUNT_REPORT}")
}

/// Path of the driver listing report.
#[must_use]
pub fn driver_report_path() -> String {
    format!("/api/data/process/{DEFAULT_DRIVER_REPORT}")
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at a fixed instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(1_717_200_000, 0).single().unwrap_or_default()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += TimeDelta::from_std(by).unwrap_or(TimeDelta::zero());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configuration pointing at the mock upstream.
#[must_use]
pub fn config_for(server: &MockServer) -> EDepotConfig {
    let base_url = url::Url::parse(&server.uri()).unwrap_or_else(|e| panic!("mock uri: {e}"));
    EDepotConfig::new(base_url)
}

/// Client pointing at the mock upstream.
#[must_use]
pub fn client_for(server: &MockServer) -> EDepotClient {
    EDepotClient::new(&config_for(server)).unwrap_or_else(|e| panic!("client: {e}"))
}

/// Directory pointing at the mock upstream, driven by `clock`.
#[must_use]
pub fn directory_for(server: &MockServer, clock: Arc<ManualClock>) -> CompanyDirectory {
    CompanyDirectory::new(client_for(server), CachePolicy::default(), clock)
}

/// Token response body.
#[must_use]
pub fn token_body(token: &str) -> Value {
    json!({ "token": token, "reqtime": "20240601101500" })
}

/// Report response body wrapping `records`.
#[must_use]
pub fn report_body(records: Value) -> Value {
    json!({ "data": records })
}

/// Mount a token endpoint that always succeeds, expecting `times` calls.
pub async fn mount_token(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1")))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount a report endpoint answering with `template`.
pub async fn mount_report(
    server: &MockServer,
    report_path: &str,
    template: ResponseTemplate,
    up_to: Option<u64>,
    times: Option<u64>,
) {
    let mut mock = Mock::given(method("POST"))
        .and(path(report_path))
        .respond_with(template);
    if let Some(n) = up_to {
        mock = mock.up_to_n_times(n);
    }
    if let Some(n) = times {
        mock = mock.expect(n);
    }
    mock.mount(server).await;
}
