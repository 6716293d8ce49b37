// HttpSource against a mock dashboard API.

use beantrack_engine::merge;
use beantrack_engine::{EntityDataSource, EntityKind};
use beantrack_source::{HttpSource, DEFAULT_TIMEOUT};
use httpmock::prelude::*;
use serde_json::json;

fn source(server: &MockServer) -> HttpSource {
    HttpSource::new(&server.base_url(), DEFAULT_TIMEOUT).unwrap()
}

#[test]
fn fetches_listing_per_entity_slug() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/beneficiaries");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {"beneficiary_id": "B-1", "first_name": "Ana"},
                {"beneficiary_id": "B-2", "first_name": "Ben"}
            ]));
    });

    let rows = source(&server).fetch_all(EntityKind::BeneficiaryList).unwrap();
    mock.assert();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("first_name"), "Ana");
}

#[test]
fn sends_bearer_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/activity-logs")
            .header("authorization", "Bearer s3cret");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"data": [{"log_id": 1}]}));
    });

    let rows = source(&server)
        .with_token("s3cret")
        .fetch_all(EntityKind::ActivityLog)
        .unwrap();
    mock.assert();
    assert_eq!(rows.len(), 1);
}

#[test]
fn server_error_becomes_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/seedlings");
        then.status(500).body("database down");
    });

    let err = source(&server).fetch_all(EntityKind::SeedlingRecord).unwrap_err();
    assert_eq!(err.entity, EntityKind::SeedlingRecord);
    assert!(err.message.contains("HTTP 500"), "got {}", err.message);
}

#[test]
fn merge_fetches_each_involved_endpoint_once() {
    let server = MockServer::start();
    let beneficiaries = server.mock(|when, then| {
        when.method(GET).path("/beneficiaries");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([{"beneficiary_id": "B-1"}]));
    });
    let plots = server.mock(|when, then| {
        when.method(GET).path("/farm-plots");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([{"plot_id": "P-1"}, {"plot_id": "P-2"}]));
    });

    let merged = merge::merge(&["ben_id", "ben_age", "farm_hectares"], &source(&server)).unwrap();
    beneficiaries.assert_hits(1);
    plots.assert_hits(1);
    assert_eq!(merged.len(), 3);
}
