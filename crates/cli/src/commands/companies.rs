//! Company directory commands.
//!
//! # Usage
//!
//! ```bash
//! edepot companies list --json
//! edepot companies get 38512
//! edepot companies user u-1024
//! edepot stats
//! ```

use edepot_core::Company;
use serde::Serialize;

use super::{CommandError, directory, print_json};

/// One-line view of a company for the default listing.
#[derive(Debug, Serialize)]
struct CompanySummary<'a> {
    id: &'a str,
    name: &'a str,
    tax_code: &'a str,
    source: &'static str,
}

impl<'a> From<&'a Company> for CompanySummary<'a> {
    fn from(company: &'a Company) -> Self {
        Self {
            id: &company.id,
            name: &company.name,
            tax_code: &company.tax_code,
            source: company.source().as_str(),
        }
    }
}

/// List every company.
pub async fn list(full: bool) -> Result<(), CommandError> {
    let companies = directory()?.fetch_all_companies().await;
    tracing::info!("Loaded {} companies", companies.len());

    if full {
        print_json(companies.as_slice())
    } else {
        let summaries: Vec<CompanySummary<'_>> =
            companies.iter().map(CompanySummary::from).collect();
        print_json(&summaries)
    }
}

/// Show one company by id.
pub async fn get(id: &str) -> Result<(), CommandError> {
    let company = directory()?
        .fetch_company_by_id(id)
        .await
        .ok_or_else(|| CommandError::NotFound(format!("id {id}")))?;
    print_json(&company)
}

/// Show the company a user or driver belongs to.
pub async fn for_user(user_id: &str) -> Result<(), CommandError> {
    let company = directory()?
        .fetch_company_for_user(user_id)
        .await
        .ok_or_else(|| CommandError::NotFound(format!("user {user_id}")))?;
    print_json(&company)
}

/// Load the directory once and print cache statistics.
pub async fn stats() -> Result<(), CommandError> {
    let directory = directory()?;
    directory.fetch_all_companies().await;

    for stat in directory.stats().await {
        tracing::info!("{stat}");
    }
    print_json(&directory.stats().await)
}
