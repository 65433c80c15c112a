//! E-Depot API client and company directory.
//!
//! Provides access to the external e-depot REST API used by the container
//! depot dashboard, and a cached directory of transport companies built on
//! top of it.
//!
//! # Architecture
//!
//! - Token per request purpose: `reqid` → token + `reqtime` → report calls
//! - Tokens held in memory only, re-acquired once on 401/403
//! - Company lists cached in memory via `moka` (10 minute TTL); stale lists
//!   are served only when every upstream source fails
//!
//! # Example
//!
//! ```rust,ignore
//! use edepot_client::{CompanyDirectory, EDepotConfig};
//!
//! let config = EDepotConfig::from_env()?;
//! let directory = CompanyDirectory::from_config(&config)?;
//!
//! let companies = directory.fetch_all_companies().await;
//! let mine = directory.fetch_company_for_user("u-1024").await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;

pub use auth::AuthSession;
pub use client::{EDepotClient, Record};
pub use config::{ConfigError, EDepotConfig};
pub use directory::{CachePolicy, CacheStat, Clock, CompanyDirectory, SystemClock};
pub use error::DepotApiError;
