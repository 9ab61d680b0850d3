//! Search and diagnosis behavior against a seeded store.

use ispstore::config::StoreConfig;
use ispstore::engine::SubscriberDirectory;
use ispstore::models::{
    Connection, Customer, CustomerBundle, Node, Plan, RouterAccount, SearchSource,
    TechnicalSubscriber, UNKNOWN, UNLINKED,
};
use ispstore::store::Store;
use std::sync::Arc;
use tempfile::tempdir;

fn setup() -> (Arc<Store>, SubscriberDirectory, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = StoreConfig::new(dir.path());
    let store = Arc::new(Store::new(&config).unwrap());
    store.initialize_schema().unwrap();
    let directory = SubscriberDirectory::new(Arc::clone(&store));
    (store, directory, dir)
}

fn node(id: &str, name: &str, ip: &str, port: Option<u16>) -> Node {
    Node {
        node_id: id.to_string(),
        name: name.to_string(),
        ip_address: Some(ip.to_string()),
        api_port: port,
    }
}

fn technical(external_id: &str, serial: &str, username: &str) -> TechnicalSubscriber {
    TechnicalSubscriber {
        external_id: external_id.to_string(),
        serial: serial.to_string(),
        olt_name: "olt-central".to_string(),
        olt_id: "1".to_string(),
        board: "2".to_string(),
        port: "4".to_string(),
        onu: "17".to_string(),
        onu_type: "bridge-onu".to_string(),
        pppoe_username: username.to_string(),
        mode: "router".to_string(),
    }
}

fn router_account(username: &str, ip: &str, mac: Option<&str>) -> RouterAccount {
    RouterAccount {
        username: username.to_string(),
        router_ip: ip.to_string(),
        password: Some("secret".to_string()),
        profile: Some("pppoe-300m".to_string()),
        caller_id: mac.map(str::to_string),
        comment: Some("installed 2024".to_string()),
        last_logout: Some("2026-07-30 11:02:44".to_string()),
    }
}

fn connection(id: i64, username: &str, customer_id: i64, node_id: &str, plan_id: i64) -> Connection {
    Connection {
        connection_id: id,
        pppoe_username: username.to_string(),
        customer_id: Some(customer_id),
        node_id: Some(node_id.to_string()),
        plan_id: Some(plan_id),
        address: Some("Main St 42".to_string()),
    }
}

fn customer(id: i64, name: &str) -> CustomerBundle {
    CustomerBundle {
        customer: Customer {
            customer_id: id,
            name: name.to_string(),
            doc_number: Some("20-12345678-9".to_string()),
            billing_status: Some("active".to_string()),
            address: Some("Billing Av 1".to_string()),
        },
        contacts: Default::default(),
    }
}

fn plan(id: i64, name: &str, speed: &str) -> Plan {
    Plan {
        plan_id: id,
        name: name.to_string(),
        speed: Some(speed.to_string()),
        description: None,
    }
}

#[test]
fn short_query_returns_empty_without_hits() {
    let (store, directory, _dir) = setup();
    store
        .replace_router_accounts("10.0.0.1", &[router_account("abc", "10.0.0.1", None)])
        .unwrap();

    assert!(directory.search("").unwrap().is_empty());
    assert!(directory.search("ab").unwrap().is_empty());
    assert!(directory.search("  ab  ").unwrap().is_empty());
    assert_eq!(directory.search("abc").unwrap().len(), 1);
}

#[test]
fn search_dedupes_by_username_with_crm_priority() {
    let (store, directory, _dir) = setup();
    store
        .replace_connections(&[connection(1, "alice@fiber", 10, "n1", 5)], true)
        .unwrap();
    store.replace_customers(&[customer(10, "Alice Doe")], true).unwrap();
    store
        .replace_technical_subscribers(&[technical("x1", "HWTC9A0", "alice@fiber")])
        .unwrap();
    store
        .replace_router_accounts("10.0.0.1", &[router_account("alice@fiber", "10.0.0.1", None)])
        .unwrap();

    let hits = directory.search("alice").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, SearchSource::Crm);
    assert_eq!(hits[0].display_name, "Alice Doe");
    assert_eq!(hits[0].customer_id, Some(10));
}

#[test]
fn search_falls_back_to_unlinked_display_name() {
    let (store, directory, _dir) = setup();
    store
        .replace_router_accounts(
            "10.0.0.1",
            &[RouterAccount {
                comment: None,
                ..router_account("ghost-user", "10.0.0.1", Some("AA:BB:CC:DD:EE:FF"))
            }],
        )
        .unwrap();

    let hits = directory.search("ghost").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, UNLINKED);
    assert_eq!(hits[0].source, SearchSource::Router);
    assert_eq!(hits[0].mac.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
}

#[test]
fn search_matches_serial_and_mac_fragments() {
    let (store, directory, _dir) = setup();
    store
        .replace_technical_subscribers(&[technical("x1", "HWTC9A0B", "bob@fiber")])
        .unwrap();
    store
        .replace_router_accounts(
            "10.0.0.1",
            &[router_account("carol@fiber", "10.0.0.1", Some("D4:CA:6D:11:22:33"))],
        )
        .unwrap();

    let by_serial = directory.search("HWTC9A0").unwrap();
    assert_eq!(by_serial.len(), 1);
    assert_eq!(by_serial[0].username, "bob@fiber");
    assert_eq!(by_serial[0].source, SearchSource::Olt);

    let by_mac = directory.search("D4:CA:6D").unwrap();
    assert_eq!(by_mac.len(), 1);
    assert_eq!(by_mac[0].username, "carol@fiber");
}

#[test]
fn diagnose_unknown_username_returns_none() {
    let (_store, directory, _dir) = setup();
    assert!(directory.diagnose("nobody@fiber").unwrap().is_none());
}

#[test]
fn router_only_username_with_unknown_ip_gets_placeholder_node() {
    let (store, directory, _dir) = setup();
    store
        .replace_router_accounts("10.9.9.9", &[router_account("loner@fiber", "10.9.9.9", None)])
        .unwrap();

    let record = directory.diagnose("loner@fiber").unwrap().unwrap();
    assert_eq!(record.node_name, "Unnamed router 10.9.9.9");
    assert_eq!(record.node_id, UNKNOWN);
    assert_eq!(record.node_ip, "10.9.9.9");
    assert_eq!(record.node_port, store.default_router_port());
    assert_eq!(record.customer_name, UNLINKED);
    assert_eq!(record.router_profile, "pppoe-300m");
}

#[test]
fn router_only_username_with_known_ip_resolves_real_node() {
    let (store, directory, _dir) = setup();
    store
        .replace_nodes(&[node("n7", "north-pop", "10.0.0.7", Some(8729))])
        .unwrap();
    store
        .replace_router_accounts("10.0.0.7", &[router_account("edge@fiber", "10.0.0.7", None)])
        .unwrap();

    let record = directory.diagnose("edge@fiber").unwrap().unwrap();
    assert_eq!(record.node_id, "n7");
    assert_eq!(record.node_name, "north-pop");
    assert_eq!(record.node_port, 8729);
}

#[test]
fn technical_only_username_is_seeded_with_sentinels() {
    let (store, directory, _dir) = setup();
    store
        .replace_technical_subscribers(&[technical("x9", "HWTC77", "dana@fiber")])
        .unwrap();

    let record = directory.diagnose("dana@fiber").unwrap().unwrap();
    assert_eq!(record.onu_serial, "HWTC77");
    assert_eq!(record.olt_name, "olt-central");
    assert_eq!(record.customer_name, UNLINKED);
    assert_eq!(record.plan_name, UNKNOWN);
    assert_eq!(record.node_name, UNKNOWN);
    assert_eq!(record.router_ip, UNKNOWN);
}

#[test]
fn administrative_record_is_authoritative_and_flat() {
    let (store, directory, _dir) = setup();
    store
        .replace_nodes(&[node("n1", "central-pop", "10.0.0.1", None)])
        .unwrap();
    store.replace_plans(&[plan(5, "Fiber 300", "300M")]).unwrap();
    store.replace_customers(&[customer(10, "Alice Doe")], true).unwrap();
    store
        .replace_connections(&[connection(1, "alice@fiber", 10, "n1", 5)], true)
        .unwrap();
    store
        .replace_technical_subscribers(&[technical("x1", "HWTC9A0", "ALICE@FIBER")])
        .unwrap();
    store
        .replace_router_accounts(
            "10.0.0.1",
            &[router_account("alice@fiber", "10.0.0.1", Some("AA:BB:CC:00:11:22"))],
        )
        .unwrap();

    let record = directory.diagnose("alice@fiber").unwrap().unwrap();
    assert_eq!(record.customer_name, "Alice Doe");
    assert_eq!(record.customer_id, Some(10));
    assert_eq!(record.address, "Main St 42");
    assert_eq!(record.plan_name, "Fiber 300");
    assert_eq!(record.plan_speed, "300M");
    assert_eq!(record.node_id, "n1");
    assert_eq!(record.node_name, "central-pop");
    assert_eq!(record.node_port, store.default_router_port());
    // Case-insensitive join picked up the OLT record.
    assert_eq!(record.onu_serial, "HWTC9A0");
    assert_eq!(record.mac, "AA:BB:CC:00:11:22");
}

#[test]
fn drift_correction_overwrites_stale_admin_node() {
    let (store, directory, _dir) = setup();
    store
        .replace_nodes(&[
            node("n1", "old-pop", "10.0.0.1", None),
            node("n2", "new-pop", "10.0.0.2", Some(8730)),
        ])
        .unwrap();
    store
        .replace_connections(&[connection(1, "mover@fiber", 10, "n1", 5)], true)
        .unwrap();
    // The router that actually holds the account is n2, not the node on file.
    store
        .replace_router_accounts("10.0.0.2", &[router_account("mover@fiber", "10.0.0.2", None)])
        .unwrap();

    let record = directory.diagnose("mover@fiber").unwrap().unwrap();
    assert_eq!(record.node_id, "n2");
    assert_eq!(record.node_name, "new-pop");
    assert_eq!(record.node_ip, "10.0.0.2");
    assert_eq!(record.node_port, 8730);
}

#[test]
fn drift_to_unknown_router_synthesizes_placeholder() {
    let (store, directory, _dir) = setup();
    store
        .replace_nodes(&[node("n1", "old-pop", "10.0.0.1", None)])
        .unwrap();
    store
        .replace_connections(&[connection(1, "mover@fiber", 10, "n1", 5)], true)
        .unwrap();
    store
        .replace_router_accounts("172.16.0.9", &[router_account("mover@fiber", "172.16.0.9", None)])
        .unwrap();

    let record = directory.diagnose("mover@fiber").unwrap().unwrap();
    assert_eq!(record.node_name, "Unnamed router 172.16.0.9");
    assert_eq!(record.node_ip, "172.16.0.9");
}

#[test]
fn multi_router_secret_prefers_administrative_node() {
    let (store, directory, _dir) = setup();
    store
        .replace_nodes(&[
            node("n1", "central-pop", "10.0.0.1", None),
            node("n2", "north-pop", "10.0.0.2", None),
        ])
        .unwrap();
    store
        .replace_connections(&[connection(1, "dual@fiber", 10, "n2", 5)], true)
        .unwrap();
    store
        .replace_router_accounts(
            "10.0.0.1",
            &[router_account("dual@fiber", "10.0.0.1", Some("AA:AA:AA:AA:AA:AA"))],
        )
        .unwrap();
    store
        .replace_router_accounts(
            "10.0.0.2",
            &[router_account("dual@fiber", "10.0.0.2", Some("BB:BB:BB:BB:BB:BB"))],
        )
        .unwrap();

    let record = directory.diagnose("dual@fiber").unwrap().unwrap();
    // The stale entry on 10.0.0.1 loses to the administratively assigned node.
    assert_eq!(record.mac, "BB:BB:BB:BB:BB:BB");
    assert_eq!(record.node_id, "n2");
    assert_eq!(record.router_ip, "10.0.0.2");
}
