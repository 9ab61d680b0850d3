//! Router client behavior against a mock REST endpoint.

use ispstore::sync::RouterSource;
use routerfetcher::{RouterCredentials, RouterFleet};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> RouterCredentials {
    RouterCredentials {
        username: "api-ops".to_string(),
        password: "hunter2".to_string(),
    }
}

fn host_port(server: &MockServer) -> (String, u16) {
    let url = Url::parse(&server.uri()).unwrap();
    (
        url.host_str().unwrap().to_string(),
        url.port().unwrap(),
    )
}

#[tokio::test]
async fn secrets_map_to_accounts_keyed_by_router_ip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/ppp/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "alice@fiber",
                "password": "pw",
                "profile": "pppoe-300m",
                "last-caller-id": "AA:BB:CC:00:11:22",
                "last-logged-out": "2026-07-30 11:02:44",
                "comment": "installed 2024"
            },
            {"profile": "orphan-row"}
        ])))
        .mount(&server)
        .await;

    let (host, port) = host_port(&server);
    let fleet = RouterFleet::new(credentials());
    let accounts = fleet.accounts(&host, port).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "alice@fiber");
    assert_eq!(accounts[0].router_ip, host);
    assert_eq!(accounts[0].profile.as_deref(), Some("pppoe-300m"));
}

#[tokio::test]
async fn active_session_lookup_is_case_insensitive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/ppp/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Alice@Fiber", "address": "100.64.0.7", "caller-id": "AA:BB", "uptime": "4h2m"}
        ])))
        .mount(&server)
        .await;

    let (host, port) = host_port(&server);
    let client = RouterFleet::new(credentials()).client(&host, port).unwrap();
    let session = client.active_session("alice@fiber").await.unwrap().unwrap();
    assert_eq!(session.address.as_deref(), Some("100.64.0.7"));
    assert!(client.active_session("bob@fiber").await.unwrap().is_none());
}

#[tokio::test]
async fn traffic_snapshot_takes_the_last_sample() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/interface/monitor-traffic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"rx-bits-per-second": "1200000", "tx-bits-per-second": "340000"}
        ])))
        .mount(&server)
        .await;

    let (host, port) = host_port(&server);
    let client = RouterFleet::new(credentials()).client(&host, port).unwrap();
    let sample = client.interface_traffic("pppoe-alice").await.unwrap();
    assert_eq!(sample.rx_bits_per_second.as_deref(), Some("1200000"));
}

#[tokio::test]
async fn unauthorized_router_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/ppp/secret"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (host, port) = host_port(&server);
    let fleet = RouterFleet::new(credentials()).with_timeout(Duration::from_secs(2));
    assert!(fleet.accounts(&host, port).await.is_err());
}
