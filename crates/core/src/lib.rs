//! E-Depot Core - Shared types library.
//!
//! This crate provides the domain types used across the E-Depot components:
//! - `client` - Upstream e-depot API client and company directory cache
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Company records and upstream field normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
