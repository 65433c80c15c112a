//! Integration tests for the company directory.
//!
//! These tests run the directory against a mocked e-depot upstream and
//! verify caching, source fallback, and the single re-authentication retry.

use std::sync::Arc;
use std::time::Duration;

use edepot_core::CompanySource;
use edepot_integration_tests::{
    ManualClock, account_report_path, directory_for, driver_report_path, mount_report,
    mount_token, report_body,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TTL_PLUS_ONE_SECOND: Duration = Duration::from_secs(601);

fn ok(records: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(report_body(records))
}

fn accounts() -> serde_json::Value {
    json!([
        { "DonViVanTaiID": "38512", "CompanyName": "ABC Logistics" },
        { "DonViVanTaiID": "38512", "CompanyName": "Dup" },
        { "DonViVanTaiID": "99", "CompanyName": "XYZ" },
    ])
}

// =============================================================================
// All Companies
// =============================================================================

#[tokio::test]
async fn test_fetch_all_deduplicates_first_wins() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(1)).await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let companies = directory.fetch_all_companies().await;

    let [first, second] = companies.as_slice() else {
        panic!("expected two companies, got {}", companies.len());
    };
    assert_eq!(first.id, "38512");
    assert_eq!(first.code, "38512");
    assert_eq!(first.name, "ABC Logistics");
    assert_eq!(first.source(), CompanySource::Primary);
    assert_eq!(second.id, "99");
    assert_eq!(second.name, "XYZ");
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(1)).await;

    let clock = Arc::new(ManualClock::new());
    let directory = directory_for(&server, Arc::clone(&clock));

    let first = directory.fetch_all_companies().await;
    clock.advance(Duration::from_secs(599));
    let second = directory.fetch_all_companies().await;

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_expired_cache_refetches() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(2)).await;

    let clock = Arc::new(ManualClock::new());
    let directory = directory_for(&server, Arc::clone(&clock));

    let first = directory.fetch_all_companies().await;
    clock.advance(TTL_PLUS_ONE_SECOND);
    let second = directory.fetch_all_companies().await;

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_empty_primary_falls_back_to_drivers() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(json!([])), None, Some(1)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([
            { "TaiXeID": "d1", "DVVanTaiID": "38512", "TenDVVanTai": "ABC Logistics" },
            { "TaiXeID": "d2", "DVVanTaiID": "38512" },
            { "TaiXeID": "d3", "DVVanTaiID": "77" },
        ])),
        None,
        Some(1),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let companies = directory.fetch_all_companies().await;

    let [first, second] = companies.as_slice() else {
        panic!("expected two companies, got {}", companies.len());
    };
    assert_eq!(first.name, "ABC Logistics");
    assert_eq!(second.name, "Company 77");
    assert!(companies.iter().all(|c| c.source() == CompanySource::Fallback));
}

#[tokio::test]
async fn test_total_failure_without_cache_is_empty() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ResponseTemplate::new(500), None, Some(1)).await;
    mount_report(&server, &driver_report_path(), ResponseTemplate::new(502), None, Some(1)).await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let companies = directory.fetch_all_companies().await;

    assert!(companies.is_empty());
    assert!(directory.stats().await.is_empty());
}

#[tokio::test]
async fn test_stale_list_served_when_all_sources_fail() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), Some(1), Some(1)).await;
    mount_report(&server, &account_report_path(), ResponseTemplate::new(500), None, Some(1)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ResponseTemplate::new(200).set_body_json(json!({ "error": "no data" })),
        None,
        Some(1),
    )
    .await;

    let clock = Arc::new(ManualClock::new());
    let directory = directory_for(&server, Arc::clone(&clock));

    let fresh = directory.fetch_all_companies().await;
    clock.advance(TTL_PLUS_ONE_SECOND);
    let stale = directory.fetch_all_companies().await;

    assert!(Arc::ptr_eq(&fresh, &stale));
    assert_eq!(stale.len(), 2);
}

// =============================================================================
// Re-authentication
// =============================================================================

#[tokio::test]
async fn test_single_401_is_retried_with_new_token() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    mount_report(&server, &account_report_path(), ResponseTemplate::new(401), Some(1), Some(1)).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(1)).await;
    mount_report(&server, &driver_report_path(), ok(json!([])), None, Some(0)).await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let companies = directory.fetch_all_companies().await;

    assert_eq!(companies.len(), 2);
    assert!(companies.iter().all(|c| c.source() == CompanySource::Primary));
}

#[tokio::test]
async fn test_repeated_403_falls_back_without_third_attempt() {
    let server = MockServer::start().await;
    // Initial token, retry token, then a fresh token for the driver report.
    mount_token(&server, 3).await;
    mount_report(&server, &account_report_path(), ResponseTemplate::new(403), None, Some(2)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([{ "TaiXeID": "d1", "DVVanTaiID": "38512" }])),
        None,
        Some(1),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let companies = directory.fetch_all_companies().await;

    let [company] = companies.as_slice() else {
        panic!("expected one company, got {}", companies.len());
    };
    assert_eq!(company.id, "38512");
    assert_eq!(company.source(), CompanySource::Fallback);
}

// =============================================================================
// Lookups
// =============================================================================

#[tokio::test]
async fn test_fetch_company_by_id() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(1)).await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));

    let company = directory.fetch_company_by_id("99").await;
    assert_eq!(company.map(|c| c.name).as_deref(), Some("XYZ"));

    // Served from cache
    assert!(directory.fetch_company_by_id("12345").await.is_none());
    assert!(directory.fetch_company_by_id("").await.is_none());
}

#[tokio::test]
async fn test_company_for_user_uses_id_precedence() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(account_report_path()))
        .and(body_partial_json(json!({ "data": { "UserID": "u-1024" } })))
        .respond_with(ok(json!([
            {
                "DVVanTaiID_CMS": "",
                "DonViVanTaiID": { "v": "38512" },
                "CompanyID": "7",
                "CompanyName": "ABC Logistics",
                "DVXuatHoaDonID": "INV-9",
                "TenDVXuatHoaDon": "ABC Billing",
            },
            { "DonViVanTaiID": "ignored" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let company = directory.fetch_company_for_user("u-1024").await;

    let company = company.unwrap_or_else(|| panic!("expected a company"));
    assert_eq!(company.id, "38512");
    assert_eq!(company.name, "ABC Logistics");
    assert_eq!(company.invoice_company_id.as_deref(), Some("INV-9"));
    assert_eq!(company.invoice_company_name.as_deref(), Some("ABC Billing"));
}

#[tokio::test]
async fn test_company_for_user_without_company_does_not_use_drivers() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(
        &server,
        &account_report_path(),
        ok(json!([{ "UserName": "lan", "CompanyName": "Should not matter" }])),
        None,
        Some(1),
    )
    .await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([{ "TaiXeID": "u-2048", "DVVanTaiID": "38512" }])),
        None,
        Some(0),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    assert!(directory.fetch_company_for_user("u-2048").await.is_none());
}

#[tokio::test]
async fn test_company_for_user_falls_back_to_driver() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(json!([])), None, Some(1)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([
            { "TaiXeID": "d-1", "DVVanTaiID": "11" },
            { "TaiXeID": "d-2", "DVVanTaiID": "38512" },
        ])),
        None,
        Some(1),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    let company = directory
        .fetch_company_for_user("d-2")
        .await
        .unwrap_or_else(|| panic!("expected a company"));

    assert_eq!(company.id, "38512");
    assert_eq!(company.name, "Company 38512");
    assert_eq!(company.source(), CompanySource::Fallback);
}

#[tokio::test]
async fn test_company_for_user_driver_without_operator() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ResponseTemplate::new(500), None, Some(2)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([{ "TaiXeID": "d-3", "DVVanTaiID": null }])),
        None,
        Some(2),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    assert!(directory.fetch_company_for_user("d-3").await.is_none());
    assert!(directory.fetch_company_for_user("d-unknown").await.is_none());
}

#[tokio::test]
async fn test_company_for_empty_user_id_skips_upstream() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(0)).await;
    mount_report(
        &server,
        &driver_report_path(),
        ok(json!([{ "TaiXeID": "", "DVVanTaiID": "38512" }])),
        None,
        Some(0),
    )
    .await;

    let directory = directory_for(&server, Arc::new(ManualClock::new()));
    assert!(directory.fetch_company_for_user("").await.is_none());
}

// =============================================================================
// Cache Management
// =============================================================================

#[tokio::test]
async fn test_invalidate_forces_refetch_and_stats_track_entries() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_report(&server, &account_report_path(), ok(accounts()), None, Some(2)).await;

    let clock = Arc::new(ManualClock::new());
    let directory = directory_for(&server, Arc::clone(&clock));

    directory.fetch_all_companies().await;
    clock.advance(Duration::from_millis(1500));

    let stats = directory.stats().await;
    let [stat] = stats.as_slice() else {
        panic!("expected one cache entry, got {}", stats.len());
    };
    assert_eq!(stat.key, "all_companies");
    assert_eq!(stat.count, 2);
    assert_eq!(stat.age_ms, 1500);

    directory.invalidate(None).await;
    assert!(directory.stats().await.is_empty());
    directory.invalidate(Some("all_companies")).await;

    let companies = directory.fetch_all_companies().await;
    assert_eq!(companies.len(), 2);
    let ages: Vec<u64> = directory.stats().await.iter().map(|stat| stat.age_ms).collect();
    assert_eq!(ages, [0]);
}
