//! Integration tests for GET/POST /api/v1/http-monitoring.

use std::sync::Arc;

use actix_web::test;
use async_trait::async_trait;
use http_monitoring_lib::config::{AccountMatch, ReportSettings};
use http_monitoring_lib::error::{AppError, AppResult};
use http_monitoring_lib::models::{format_date, local_today};
use http_monitoring_lib::services::storage::ReportSource;
use http_monitoring_lib::services::{ReportReader, ReportStore};

use super::test_helpers::*;

const DATE: &str = "2015-03-07";

async fn sample_app(
    account_match: AccountMatch,
) -> (
    ReportFixture,
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) {
    let fixture = ReportFixture::new();
    fixture.write_report(DATE, "traffic", SAMPLE_REPORT.as_bytes());
    let app = create_test_app(fixture.reader(account_match)).await;
    (fixture, app)
}

fn uri(query: &str) -> String {
    format!("/api/v1/http-monitoring?{}", query)
}

#[actix_rt::test]
async fn test_account_filter_returns_matching_rows() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, content_type, body) =
        get(&app, &uri("report=traffic&date=2015-03-07&account=acct1")).await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "text/csv");
    assert_eq!(body, b"a\tacct1\tx\nc\tacct1\tx\n");
}

#[actix_rt::test]
async fn test_account_filter_with_top() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, _, body) =
        get(&app, &uri("report=traffic&date=2015-03-07&account=acct1&top=1")).await;

    assert_eq!(status, 200);
    assert_eq!(body, b"a\tacct1\tx\n");
}

#[actix_rt::test]
async fn test_without_filter_returns_whole_file() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, _, body) = get(&app, &uri("report=traffic&date=2015-03-07")).await;

    assert_eq!(status, 200);
    assert_eq!(body, SAMPLE_REPORT.as_bytes());
}

#[actix_rt::test]
async fn test_top_without_filter() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (_, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&top=2")).await;

    assert_eq!(body, b"a\tacct1\tx\nb\tacct2\tx\n");
}

#[actix_rt::test]
async fn test_non_numeric_top_is_ignored() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (_, _, unlimited) = get(&app, &uri("report=traffic&date=2015-03-07")).await;
    let (status, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&top=abc")).await;

    assert_eq!(status, 200);
    assert_eq!(body, unlimited);
}

#[actix_rt::test]
async fn test_top_minus_one_is_unlimited_and_zero_is_empty() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (_, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&top=-1")).await;
    assert_eq!(body, SAMPLE_REPORT.as_bytes());

    let (status, content_type, body) =
        get(&app, &uri("report=traffic&date=2015-03-07&top=0")).await;
    assert_eq!(status, 200);
    assert_eq!(content_type, "text/csv");
    assert!(body.is_empty());
}

#[actix_rt::test]
async fn test_repeated_requests_are_identical() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;
    let query = uri("report=traffic&date=2015-03-07&account=acct1&top=5");

    let (_, _, first) = get(&app, &query).await;
    let (_, _, second) = get(&app, &query).await;

    assert_eq!(first, second);
}

#[actix_rt::test]
async fn test_date_defaults_to_today() {
    let fixture = ReportFixture::new();
    let today = format_date(local_today());
    fixture.write_report(&today, "traffic", b"today\tacct1\tx\n");
    let app = create_test_app(fixture.reader(AccountMatch::Regex)).await;

    let (status, _, body) = get(&app, &uri("report=traffic")).await;

    assert_eq!(status, 200);
    assert_eq!(body, b"today\tacct1\tx\n");
}

#[actix_rt::test]
async fn test_missing_report_file_is_not_found() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, content_type, body) =
        get(&app, &uri("report=traffic&date=2015-03-08&account=acct1")).await;

    assert_eq!(status, 404);
    assert_eq!(content_type, "text/csv");
    assert!(body.starts_with(b"NOT_FOUND: "));
    assert!(!body.windows(5).any(|w| w == b"acct1"));
}

/// Store whose every open fails with an access error.
struct DeniedStore;

#[async_trait]
impl ReportStore for DeniedStore {
    async fn open(&self, _path: &str) -> AppResult<ReportSource> {
        Err(AppError::Storage("permission denied".to_string()))
    }

    async fn check(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "denied"
    }
}

#[actix_rt::test]
async fn test_storage_failure_on_open_is_server_error() {
    let reader = ReportReader::new(Arc::new(DeniedStore), ReportSettings::default());
    let app = create_test_app(reader).await;

    let (status, content_type, body) =
        get(&app, &uri("report=traffic&date=2015-03-07&account=acct1")).await;

    assert_eq!(status, 500);
    assert_eq!(content_type, "text/csv");
    assert!(body.starts_with(b"STORAGE_ERROR: "));
    assert_eq!(body, b"STORAGE_ERROR: Storage error: permission denied\n");
}

#[actix_rt::test]
async fn test_malformed_date_is_not_found() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, _, _) = get(&app, &uri("report=traffic&date=07%2F03%2F2015")).await;
    assert_eq!(status, 404);

    let (status, _, _) = get(&app, &uri("report=traffic&date=")).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_date_cannot_escape_store_root() {
    let (fixture, app) = sample_app(AccountMatch::Regex).await;
    std::fs::write(fixture.root().join("http_monitoring_secret.csv"), "secret\n").unwrap();

    let (status, _, body) = get(
        &app,
        &uri("report=secret&date=..%2F..%2F..%2F.."),
    )
    .await;

    assert_eq!(status, 404);
    assert!(!body.starts_with(b"secret"));
}

#[actix_rt::test]
async fn test_missing_report_parameter_is_rejected() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, content_type, body) = get(&app, &uri("date=2015-03-07")).await;

    assert_eq!(status, 400);
    assert_eq!(content_type, "text/csv");
    assert!(body.starts_with(b"INVALID_INPUT: "));
}

#[actix_rt::test]
async fn test_account_is_a_pattern_in_regex_mode() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (status, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&account=acct.")).await;
    assert_eq!(status, 200);
    assert_eq!(body, SAMPLE_REPORT.as_bytes());

    let (status, _, _) = get(&app, &uri("report=traffic&date=2015-03-07&account=acct(")).await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_account_is_literal_in_literal_mode() {
    let (_fixture, app) = sample_app(AccountMatch::Literal).await;

    let (status, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&account=acct.")).await;
    assert_eq!(status, 200);
    assert!(body.is_empty());

    let (status, _, body) = get(&app, &uri("report=traffic&date=2015-03-07&account=acct(")).await;
    assert_eq!(status, 200);
    assert!(body.is_empty());
}

#[actix_rt::test]
async fn test_first_parameter_occurrence_wins() {
    let (_fixture, app) = sample_app(AccountMatch::Regex).await;

    let (_, _, body) = get(
        &app,
        &uri("report=traffic&date=2015-03-07&account=acct2&account=acct1"),
    )
    .await;

    assert_eq!(body, b"b\tacct2\tx\n");
}

#[actix_rt::test]
async fn test_original_bytes_are_preserved() {
    let fixture = ReportFixture::new();
    fixture.write_report(DATE, "raw", b"\"q,1\"\tacct1\t\xe9t\xe9\r\nlast\tacct1\tend");
    let app = create_test_app(fixture.reader(AccountMatch::Regex)).await;

    let (status, _, body) = get(&app, &uri("report=raw&date=2015-03-07&account=acct1")).await;

    assert_eq!(status, 200);
    assert_eq!(body, b"\"q,1\"\tacct1\t\xe9t\xe9\nlast\tacct1\tend\n");
}

#[actix_rt::test]
async fn test_post_is_a_no_op() {
    let (fixture, app) = sample_app(AccountMatch::Regex).await;

    let req = test::TestRequest::post()
        .uri(&uri("report=traffic&date=2015-03-07"))
        .set_payload("ignored")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert!(test::read_body(resp).await.is_empty());

    let stored = std::fs::read(
        fixture
            .root()
            .join("user/rucio01/reports/2015-03-07/http_monitoring_traffic.csv"),
    )
    .unwrap();
    assert_eq!(stored, SAMPLE_REPORT.as_bytes());
}
