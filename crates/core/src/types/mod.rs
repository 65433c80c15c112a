//! Core types for the E-Depot dashboard.
//!
//! This module provides the company record served to consumers and the
//! normalization rule applied to every upstream field.

pub mod company;
pub mod field;

pub use company::{COMPANY_TYPE, Company, CompanySource, RawSource};
pub use field::{RawField, normalize};
