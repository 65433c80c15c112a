//! Cache types for the company directory.
//!
//! Entries never expire out of the store on their own: a stale entry is
//! kept so it can be served when a refresh fails. Freshness is decided by
//! [`CachePolicy`] against an injectable [`Clock`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use edepot_core::Company;
use moka::future::Cache;
use serde::Serialize;

/// Cache key for the full company list.
pub const ALL_COMPANIES_KEY: &str = "all_companies";

const MAX_ENTRIES: u64 = 64;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Freshness policy for cached company lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an entry is served without refetching.
    pub ttl: Duration,
}

impl CachePolicy {
    /// Create a policy with the given lifetime.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Create an entry for `companies` fetched at `now`.
    #[must_use]
    pub fn entry(&self, companies: Vec<Company>, now: DateTime<Utc>) -> CacheEntry {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        CacheEntry {
            companies: Arc::new(companies),
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(600)) // 10 minutes
    }
}

/// A cached company list.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Shared list; hits hand out clones of this `Arc`.
    pub companies: Arc<Vec<Company>>,
    /// When the list was stored.
    pub created_at: DateTime<Utc>,
    /// When the list stops being fresh.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry may be served without refetching.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Age in milliseconds, zero if the clock moved backwards.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.created_at).num_milliseconds()).unwrap_or(0)
    }
}

/// Snapshot of one cache entry, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStat {
    /// Cache key.
    pub key: String,
    /// Number of companies stored.
    pub count: usize,
    /// Milliseconds since the entry was stored.
    pub age_ms: u64,
    /// RFC 3339 timestamp of when the entry was stored.
    pub timestamp: String,
}

impl fmt::Display for CacheStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} companies, {} ms old (cached at {})",
            self.key, self.count, self.age_ms, self.timestamp
        )
    }
}

/// Keyed store of company lists.
#[derive(Clone)]
pub struct CompanyCache {
    entries: Cache<String, CacheEntry>,
}

impl CompanyCache {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }

    /// Get the entry under `key`, fresh or stale.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).await
    }

    /// Replace the entry under `key`.
    pub async fn insert(&self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry).await;
    }

    /// Remove one entry, or every entry when `key` is `None`.
    pub async fn invalidate(&self, key: Option<&str>) {
        match key {
            Some(key) => self.entries.invalidate(key).await,
            None => self.entries.invalidate_all(),
        }
        self.entries.run_pending_tasks().await;
    }

    /// Describe every stored entry, sorted by key.
    pub fn stats(&self, now: DateTime<Utc>) -> Vec<CacheStat> {
        let mut stats: Vec<CacheStat> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheStat {
                key: key.as_ref().clone(),
                count: entry.companies.len(),
                age_ms: entry.age_ms(now),
                timestamp: entry.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            })
            .collect();
        stats.sort_by(|a, b| a.key.cmp(&b.key));
        stats
    }
}

impl Default for CompanyCache {
    fn default() -> Self {
        Self::new()
    }
}
