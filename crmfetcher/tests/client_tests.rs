//! Session and pagination behavior against a mock CRM.

use crmfetcher::{AdminClient, Credentials};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials {
        username: "ops".to_string(),
        password: "hunter2".to_string(),
        api_key: "key-123".to_string(),
        client_id: "client-9".to_string(),
    }
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/sanctum/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn bearer_token_is_acquired_lazily_and_sent() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1").await;
    Mock::given(method("GET"))
        .and(path("/nodes/nodes_list"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("api-key", "key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "comment": "central-pop", "ip": "10.0.0.1"}]
        })))
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials()).unwrap();
    let nodes = client.nodes_list().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node_id, "1");
    assert_eq!(nodes[0].name, "central-pop");
    assert_eq!(nodes[0].ip_address.as_deref(), Some("10.0.0.1"));
}

/// First call is rejected with 401, the replay with a fresh token succeeds.
struct ExpiredThenOk {
    calls: Arc<AtomicUsize>,
}

impl Respond for ExpiredThenOk {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let authorization = request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if call == 0 || authorization != "Bearer tok-fresh" {
            ResponseTemplate::new(401)
        } else {
            ResponseTemplate::new(200).set_body_json(json!([
                {"id": 5, "name": "Fiber 300", "speed": "300M"}
            ]))
        }
    }
}

#[tokio::test]
async fn expired_token_is_refreshed_and_replayed_once() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-fresh").await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/plans/plans_list"))
        .respond_with(ExpiredThenOk {
            calls: Arc::clone(&calls),
        })
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials()).unwrap();
    let plans = client.plans_list().await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persistent_auth_failure_escalates_after_one_retry() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-any").await;
    Mock::given(method("GET"))
        .and(path("/plans/plans_list"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials()).unwrap();
    let err = client.plans_list().await.unwrap_err();
    assert!(err.to_string().contains("authentication failed"));
}

#[tokio::test]
async fn token_endpoint_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sanctum/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials()).unwrap();
    let err = client.nodes_list().await.unwrap_err();
    assert!(err.to_string().contains("token endpoint"));
}

#[tokio::test]
async fn connections_are_paginated_and_filtered_to_pppoe() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1").await;

    let page = |rows: serde_json::Value| ResponseTemplate::new(200).set_body_json(rows);
    Mock::given(method("GET"))
        .and(path("/connections/connections_list"))
        .and(query_param("offset", "0"))
        .respond_with(page(json!([
            {"id": 1, "user": "alice@fiber", "conntype": "pppoe", "customer_id": 10, "node_id": "n1", "plan_id": 5},
            {"id": 2, "user": "static-wan", "conntype": "static", "customer_id": 11},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/connections/connections_list"))
        .and(query_param("offset", "2"))
        .respond_with(page(json!([
            {"id": 3, "user": "bob@fiber", "conntype": "pppoe", "customer_id": 12},
        ])))
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials())
        .unwrap()
        .with_page_size(2);
    let pull = client.connections_list().await.unwrap();
    assert!(pull.partial.is_none());
    let usernames: Vec<&str> = pull
        .records
        .iter()
        .map(|c| c.pppoe_username.as_str())
        .collect();
    assert_eq!(usernames, vec!["alice@fiber", "bob@fiber"]);
}

#[tokio::test]
async fn customer_pull_survives_a_mid_stream_failure() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1").await;

    Mock::given(method("GET"))
        .and(path("/customers/customers_list"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "name": "Alice Doe", "emails": [{"value": "alice@example.com"}]},
            {"id": 11, "name": "Bob Ray"},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customers/customers_list"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = AdminClient::new(&server.uri(), credentials())
        .unwrap()
        .with_page_size(2);
    let pull = client.customers_list().await.unwrap();
    assert_eq!(pull.records.len(), 2);
    assert!(pull.partial.is_some());
    assert_eq!(pull.records[0].contacts.emails, vec!["alice@example.com".to_string()]);
}
