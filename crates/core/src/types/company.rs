//! Company (transport operator) records.
//!
//! Companies are extracted from upstream account and driver records and
//! served to the dashboard. Field names serialize in camelCase to match
//! what the frontend consumes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification tag carried by every company in this directory.
pub const COMPANY_TYPE: &str = "TRANSPORT";

/// Which upstream source a company was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySource {
    /// Account/profile listing report.
    Primary,
    /// Driver listing report.
    Fallback,
}

impl CompanySource {
    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for CompanySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a company record, kept for debugging and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSource {
    /// Source the record came from.
    pub source: CompanySource,
    /// Original upstream fields, untouched.
    pub fields: Map<String, Value>,
}

impl RawSource {
    /// Create a provenance record.
    #[must_use]
    pub const fn new(source: CompanySource, fields: Map<String, Value>) -> Self {
        Self { source, fields }
    }
}

/// A transport company known to the depot.
///
/// `id` and `code` always hold the same value: upstream exposes a single
/// identifier and consumers read either field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Upstream identifier.
    pub id: String,
    /// Same value as `id`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Tax registration code.
    pub tax_code: String,
    /// Postal address.
    pub address: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Contact person name.
    pub contact_person: String,
    /// Classification tag, always [`COMPANY_TYPE`].
    #[serde(rename = "type")]
    pub company_type: String,
    /// Alternate invoicing company id (single-user resolution only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_company_id: Option<String>,
    /// Alternate invoicing company name (single-user resolution only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_company_name: Option<String>,
    /// Where this record came from.
    pub raw_source: RawSource,
}

impl Company {
    /// Create a company with the given id and name and empty contact fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, raw_source: RawSource) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            name: name.into(),
            tax_code: String::new(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            contact_person: String::new(),
            company_type: COMPANY_TYPE.to_string(),
            invoice_company_id: None,
            invoice_company_name: None,
            raw_source,
        }
    }

    /// Source this company was extracted from.
    #[must_use]
    pub const fn source(&self) -> CompanySource {
        self.raw_source.source
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_company_mirrors_id_into_code() {
        let company = Company::new(
            "38512",
            "ABC Logistics",
            RawSource::new(CompanySource::Primary, Map::new()),
        );
        assert_eq!(company.id, "38512");
        assert_eq!(company.code, "38512");
        assert_eq!(company.company_type, COMPANY_TYPE);
        assert_eq!(company.tax_code, "");
        assert!(company.invoice_company_id.is_none());
    }

    #[test]
    fn test_company_serializes_camel_case() {
        let mut company = Company::new(
            "99",
            "XYZ",
            RawSource::new(CompanySource::Fallback, Map::new()),
        );
        company.contact_person = "Lan".to_string();

        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["contactPerson"], json!("Lan"));
        assert_eq!(value["type"], json!("TRANSPORT"));
        assert_eq!(value["rawSource"]["source"], json!("fallback"));
        assert!(value.get("invoiceCompanyId").is_none());
    }

    #[test]
    fn test_company_source_display() {
        assert_eq!(CompanySource::Primary.to_string(), "primary");
        assert_eq!(CompanySource::Fallback.to_string(), "fallback");
    }
}
