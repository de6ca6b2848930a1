//! End-to-end fetches through the blocking reqwest transport
//!
//! Uses wiremock to serve per-fleet responses. The blocking client must not
//! run on a runtime thread, so each fetch goes through `spawn_blocking`.

use fleet_tables::fetch::{ClientConfig, FetchError, Fetcher, Fleets, Pagination};
use fleet_tables::reports::{DEVICES, POINTS_OF_COLLECTION};
use fleet_tables::Table;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fleets() -> Fleets {
    [("north", "key-north"), ("south", "key-south")]
        .into_iter()
        .collect()
}

async fn run_blocking<F>(f: F) -> Result<Table, FetchError>
where
    F: FnOnce() -> Result<Table, FetchError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("fetch task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn devices_are_merged_across_fleets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{DEVICES}")))
        .and(header("Cobli-Api-Key", "key-north"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1", "vehicle": {"plate": "ABC1234", "model": "Cargo"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{DEVICES}")))
        .and(header("Cobli-Api-Key", "key-south"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d2", "vehicle": {"plate": "XYZ9876"}},
            {"id": "d3", "vehicle": {"plate": "QWE4567"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_base_url(server.uri());
    let table = run_blocking(move || Fetcher::new(config)?.devices(&fleets()))
        .await
        .unwrap();

    assert_eq!(table.num_rows(), 3);
    assert_eq!(
        table.columns(),
        &["id", "fleet_name", "vehicle.plate", "vehicle.model"]
    );
    assert_eq!(table.get(0, "fleet_name"), Some(&json!("north")));
    assert_eq!(table.get(2, "fleet_name"), Some(&json!("south")));
    assert_eq!(table.get(2, "vehicle.model"), Some(&serde_json::Value::Null));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_fleet_reports_retrieve_data_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Cobli-Api-Key", "key-north"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "d1"}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("Cobli-Api-Key", "key-south"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_base_url(server.uri());
    let err = run_blocking(move || Fetcher::new(config)?.devices(&fleets()))
        .await
        .unwrap_err();

    match err {
        FetchError::RetrieveData {
            fleet,
            resource,
            status,
        } => {
            assert_eq!(fleet, "south");
            assert_eq!(resource, DEVICES);
            assert_eq!(status, 403);
        }
        other => panic!("expected RetrieveData, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn points_of_collection_are_paged_until_empty() {
    let server = MockServer::start().await;

    for (offset, body) in [
        ("0", json!([{"id": "p0", "address": {"city": "Campinas"}}])),
        ("1", json!([{"id": "p1", "address": {"city": "Santos"}}])),
        ("2", json!([])),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/{POINTS_OF_COLLECTION}")))
            .and(query_param("offset", offset))
            .and(query_param("limit", "1"))
            .and(query_param("startTimestamp", "1709251200000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    let config = ClientConfig::default().with_base_url(server.uri());
    let table = run_blocking(move || {
        use chrono::{TimeZone, Utc};
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let fleets: Fleets = [("north", "key-north")].into_iter().collect();
        Fetcher::new(config)?.points_of_collection(&fleets, &start, &end, Pagination::default())
    })
    .await
    .unwrap();

    let cities: Vec<_> = table.column("address.city").unwrap().cloned().collect();
    assert_eq!(cities, vec![json!("Campinas"), json!("Santos")]);
    assert_eq!(table.columns(), &["id", "fleet_name", "address.city"]);
}
