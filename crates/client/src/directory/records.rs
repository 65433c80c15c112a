//! Mapping from upstream report records to [`Company`] values.

use std::collections::HashSet;

use edepot_core::{Company, CompanySource, RawField, RawSource};

use crate::client::Record;

/// Company identifier fields, highest precedence first.
pub const COMPANY_ID_FIELDS: [&str; 5] = [
    "DVVanTaiID_CMS",
    "DonViVanTaiID",
    "CompanyID",
    "DVKhaiThacID",
    "NhomTaiKhoanID",
];

/// Company name fields, highest precedence first.
const COMPANY_NAME_FIELDS: [&str; 2] = ["CompanyName", "TenDonViVanTai"];

const TAX_CODE_FIELD: &str = "MaSoThue";
const ADDRESS_FIELD: &str = "DiaChi";
const PHONE_FIELD: &str = "SoDienThoai";
const EMAIL_FIELD: &str = "Email";
const CONTACT_PERSON_FIELD: &str = "NguoiLienHe";
const INVOICE_COMPANY_ID_FIELD: &str = "DVXuatHoaDonID";
const INVOICE_COMPANY_NAME_FIELD: &str = "TenDVXuatHoaDon";

/// Request field scoping the account report to one user.
pub const USER_ID_FIELD: &str = "UserID";

const DRIVER_ID_FIELD: &str = "TaiXeID";
const DRIVER_COMPANY_ID_FIELD: &str = "DVVanTaiID";
const DRIVER_COMPANY_NAME_FIELD: &str = "TenDVVanTai";

/// Normalized value of a single record field.
#[must_use]
pub fn field(record: &Record, key: &str) -> String {
    RawField::from_value(record.get(key)).normalized()
}

/// First non-empty normalized value among `keys`.
fn first_field(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .map(|key| field(record, key))
        .find(|value| !value.is_empty())
}

fn optional_field(record: &Record, key: &str) -> Option<String> {
    Some(field(record, key)).filter(|value| !value.is_empty())
}

/// Label used for companies upstream did not name.
#[must_use]
pub fn synthesized_name(prefix: &str, id: &str) -> String {
    format!("{prefix} {id}")
}

/// Resolve the company identifier of an account record.
///
/// Walks [`COMPANY_ID_FIELDS`] in order and returns the first non-empty
/// value.
#[must_use]
pub fn resolve_company_id(record: &Record) -> Option<String> {
    first_field(record, &COMPANY_ID_FIELDS)
}

/// Build a company from an account record.
///
/// Returns `None` when the record carries no company identifier.
#[must_use]
pub fn company_from_account(record: &Record, name_prefix: &str) -> Option<Company> {
    let id = resolve_company_id(record)?;
    let name = first_field(record, &COMPANY_NAME_FIELDS)
        .unwrap_or_else(|| synthesized_name(name_prefix, &id));

    let mut company = Company::new(
        id,
        name,
        RawSource::new(CompanySource::Primary, record.clone()),
    );
    company.tax_code = field(record, TAX_CODE_FIELD);
    company.address = field(record, ADDRESS_FIELD);
    company.phone = field(record, PHONE_FIELD);
    company.email = field(record, EMAIL_FIELD);
    company.contact_person = field(record, CONTACT_PERSON_FIELD);

    Some(company)
}

/// Build the company of a single user from their account record.
///
/// Same as [`company_from_account`], plus the alternate invoicing identity.
#[must_use]
pub fn company_for_user(record: &Record, name_prefix: &str) -> Option<Company> {
    let mut company = company_from_account(record, name_prefix)?;
    company.invoice_company_id = optional_field(record, INVOICE_COMPANY_ID_FIELD);
    company.invoice_company_name = optional_field(record, INVOICE_COMPANY_NAME_FIELD);
    Some(company)
}

/// Build the deduplicated company list from account records.
///
/// The first record bearing an identifier wins; later records with the same
/// identifier are ignored.
#[must_use]
pub fn companies_from_accounts(records: &[Record], name_prefix: &str) -> Vec<Company> {
    dedup(
        records
            .iter()
            .filter_map(|record| company_from_account(record, name_prefix)),
    )
}

/// Build a minimal company from a driver's assigned operator.
#[must_use]
pub fn company_from_driver(record: &Record, name_prefix: &str) -> Option<Company> {
    let id = optional_field(record, DRIVER_COMPANY_ID_FIELD)?;
    let name = optional_field(record, DRIVER_COMPANY_NAME_FIELD)
        .unwrap_or_else(|| synthesized_name(name_prefix, &id));

    Some(Company::new(
        id,
        name,
        RawSource::new(CompanySource::Fallback, record.clone()),
    ))
}

/// Build the deduplicated company list from driver records.
#[must_use]
pub fn companies_from_drivers(records: &[Record], name_prefix: &str) -> Vec<Company> {
    dedup(
        records
            .iter()
            .filter_map(|record| company_from_driver(record, name_prefix)),
    )
}

/// Find the driver with the given id and derive their company.
///
/// Returns `None` if no driver matches or the driver has no operator.
#[must_use]
pub fn company_for_driver(
    records: &[Record],
    driver_id: &str,
    name_prefix: &str,
) -> Option<Company> {
    if driver_id.is_empty() {
        return None;
    }

    records
        .iter()
        .find(|record| field(record, DRIVER_ID_FIELD) == driver_id)
        .and_then(|record| company_from_driver(record, name_prefix))
}

fn dedup(companies: impl Iterator<Item = Company>) -> Vec<Company> {
    let mut seen = HashSet::new();
    companies
        .filter(|company| seen.insert(company.id.clone()))
        .collect()
}
