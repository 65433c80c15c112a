//! Cached directory of transport companies.
//!
//! Companies are extracted from the account listing report, or from the
//! driver listing report when the former has nothing usable, and cached for
//! a configurable lifetime (10 minutes by default).
//!
//! # Failure handling
//!
//! Every operation here is total: upstream failures are logged and turned
//! into a degraded result (stale data, an empty list, or `None`). Callers
//! never need to handle errors from this module.

mod cache;
pub mod records;

use std::sync::Arc;

use edepot_core::Company;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::client::EDepotClient;
use crate::config::EDepotConfig;
use crate::error::DepotApiError;

pub use cache::{
    ALL_COMPANIES_KEY, CacheEntry, CachePolicy, CacheStat, Clock, CompanyCache, SystemClock,
};

/// Company directory backed by the e-depot API.
///
/// Construct once at startup and share by cloning; clones share the cache
/// and the upstream session.
#[derive(Clone)]
pub struct CompanyDirectory {
    inner: Arc<CompanyDirectoryInner>,
}

struct CompanyDirectoryInner {
    client: EDepotClient,
    cache: CompanyCache,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl CompanyDirectory {
    /// Create a directory over an existing client.
    #[must_use]
    pub fn new(client: EDepotClient, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(CompanyDirectoryInner {
                client,
                cache: CompanyCache::new(),
                policy,
                clock,
            }),
        }
    }

    /// Create a directory from configuration, using the system clock.
    ///
    /// # Errors
    ///
    /// Returns `DepotApiError::Http` if the HTTP client cannot be created.
    pub fn from_config(config: &EDepotConfig) -> Result<Self, DepotApiError> {
        let client = EDepotClient::new(config)?;
        Ok(Self::new(
            client,
            CachePolicy::new(config.cache_ttl),
            Arc::new(SystemClock),
        ))
    }

    /// The underlying API client.
    #[must_use]
    pub fn client(&self) -> &EDepotClient {
        &self.inner.client
    }

    fn name_prefix(&self) -> &str {
        &self.inner.client.config().company_name_prefix
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get every known company.
    ///
    /// A fresh cached list is returned as-is. Otherwise the account report is
    /// queried, then the driver report; if both come back empty or fail, the
    /// previous (stale) list is returned, or an empty list if there is none.
    #[instrument(skip(self))]
    pub async fn fetch_all_companies(&self) -> Arc<Vec<Company>> {
        let previous = self.inner.cache.get(ALL_COMPANIES_KEY).await;

        if let Some(entry) = &previous
            && entry.is_fresh(self.inner.clock.now())
        {
            debug!("Cache hit for all companies");
            return Arc::clone(&entry.companies);
        }

        let companies = match self.load_from_accounts().await {
            Some(companies) => Some(companies),
            None => self.load_from_drivers().await,
        };

        if let Some(companies) = companies {
            let entry = self.inner.policy.entry(companies, self.inner.clock.now());
            let result = Arc::clone(&entry.companies);
            self.inner.cache.insert(ALL_COMPANIES_KEY, entry).await;
            info!(count = result.len(), "Refreshed company directory");
            return result;
        }

        if let Some(entry) = previous {
            warn!(
                age_ms = entry.age_ms(self.inner.clock.now()),
                "All company sources failed, serving stale list"
            );
            return entry.companies;
        }

        warn!("All company sources failed and nothing is cached");
        Arc::new(Vec::new())
    }

    /// Get a company by its identifier.
    ///
    /// Looks the id up in [`fetch_all_companies`](Self::fetch_all_companies),
    /// so it shares that cache.
    #[instrument(skip(self))]
    pub async fn fetch_company_by_id(&self, id: &str) -> Option<Company> {
        if id.is_empty() {
            return None;
        }

        let company = self
            .fetch_all_companies()
            .await
            .iter()
            .find(|company| company.id == id)
            .cloned();

        if company.is_none() {
            warn!("Company not found");
        }
        company
    }

    /// Resolve the company a user belongs to.
    ///
    /// The account report is queried for the user first. If it returns a
    /// record, the company comes from that record alone: a record without any
    /// company identifier means the user has no company. Only when the
    /// account report yields nothing is the driver report searched for a
    /// driver with this id.
    ///
    /// An empty `user_id` resolves to `None` without querying upstream.
    #[instrument(skip(self))]
    pub async fn fetch_company_for_user(&self, user_id: &str) -> Option<Company> {
        if user_id.is_empty() {
            return None;
        }

        let client = &self.inner.client;
        let config = client.config();

        let mut data = Map::new();
        data.insert(
            records::USER_ID_FIELD.to_string(),
            Value::String(user_id.to_string()),
        );

        match client
            .fetch_report(&config.account_report, &Value::Object(data))
            .await
        {
            Ok(account_records) => {
                if let Some(record) = account_records.first() {
                    let company = records::company_for_user(record, self.name_prefix());
                    if company.is_none() {
                        warn!("User has no associated company");
                    }
                    return company;
                }
                warn!("Account report returned no records for user");
            }
            Err(e) => warn!(error = %e, "Account report failed for user"),
        }

        match client
            .fetch_report(&config.driver_report, &Value::Object(Map::new()))
            .await
        {
            Ok(driver_records) => {
                let company =
                    records::company_for_driver(&driver_records, user_id, self.name_prefix());
                if company.is_none() {
                    warn!("No driver with an assigned company matches user");
                }
                company
            }
            Err(e) => {
                warn!(error = %e, "Driver report failed for user");
                None
            }
        }
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop one cache entry, or all of them when `key` is `None`.
    pub async fn invalidate(&self, key: Option<&str>) {
        self.inner.cache.invalidate(key).await;
        debug!(key = key.unwrap_or("*"), "Invalidated company cache");
    }

    /// Describe the current cache contents.
    pub async fn stats(&self) -> Vec<CacheStat> {
        self.inner.cache.stats(self.inner.clock.now())
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Companies from the account report, or `None` if it has nothing usable.
    async fn load_from_accounts(&self) -> Option<Vec<Company>> {
        let client = &self.inner.client;
        let report = &client.config().account_report;

        match client.fetch_report(report, &Value::Object(Map::new())).await {
            Ok(account_records) => {
                let companies =
                    records::companies_from_accounts(&account_records, self.name_prefix());
                if companies.is_empty() {
                    warn!(
                        records = account_records.len(),
                        "Account report yielded no companies, trying driver report"
                    );
                    return None;
                }
                Some(companies)
            }
            Err(e) => {
                warn!(error = %e, "Account report failed, trying driver report");
                None
            }
        }
    }

    /// Companies derived from the driver report, or `None` if it has nothing usable.
    async fn load_from_drivers(&self) -> Option<Vec<Company>> {
        let client = &self.inner.client;
        let report = &client.config().driver_report;

        match client.fetch_report(report, &Value::Object(Map::new())).await {
            Ok(driver_records) => {
                let companies =
                    records::companies_from_drivers(&driver_records, self.name_prefix());
                if companies.is_empty() {
                    warn!(records = driver_records.len(), "Driver report yielded no companies");
                    return None;
                }
                Some(companies)
            }
            Err(e) => {
                warn!(error = %e, "Driver report failed");
                None
            }
        }
    }
}
