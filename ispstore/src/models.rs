use serde::{Deserialize, Serialize};

// --- Local store (SQLite) row types ---

/// A network access point with a management IP.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Node {
    pub node_id: String,
    pub name: String,
    pub ip_address: Option<String>,
    /// Management API port; `None` falls back to the configured default.
    pub api_port: Option<u16>,
}

/// One ONU provisioning record from the OLT platform.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TechnicalSubscriber {
    pub external_id: String,
    pub serial: String,
    pub olt_name: String,
    pub olt_id: String,
    pub board: String,
    pub port: String,
    pub onu: String,
    pub onu_type: String,
    pub pppoe_username: String,
    pub mode: String,
}

/// An administrative account from the CRM.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub doc_number: Option<String>,
    pub billing_status: Option<String>,
    pub address: Option<String>,
}

/// The CRM's PPPoE provisioning record; joins Customer to Node and Plan.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Connection {
    pub connection_id: i64,
    pub pppoe_username: String,
    pub customer_id: Option<i64>,
    pub node_id: Option<String>,
    pub plan_id: Option<i64>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Plan {
    pub plan_id: i64,
    pub name: String,
    pub speed: Option<String>,
    pub description: Option<String>,
}

/// A router's local AAA entry for one PPPoE username.
///
/// Keyed by `(username, router_ip)`: the same username may exist on more
/// than one router across migrations, and both rows are valid history.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouterAccount {
    pub username: String,
    pub router_ip: String,
    pub password: Option<String>,
    pub profile: Option<String>,
    pub caller_id: Option<String>,
    pub comment: Option<String>,
    pub last_logout: Option<String>,
}

/// Customer contact lists shipped alongside each customer record.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CustomerContacts {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// A customer plus the contact sub-lists the CRM returns with it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerBundle {
    pub customer: Customer,
    pub contacts: CustomerContacts,
}

// --- Sync audit ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Ok,
    Partial,
    Empty,
    Error,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Ok => "ok",
            SyncOutcome::Partial => "partial",
            SyncOutcome::Empty => "empty",
            SyncOutcome::Error => "error",
        }
    }
}

/// One append-only audit row per sync attempt per source.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncStatus {
    pub id: i64,
    pub source: String,
    pub synced_at: String,
    pub outcome: String,
    pub detail: Option<String>,
}

// --- Reconciliation output types ---

/// Which source a search hit was reconciled from. Ordering is the dedup
/// priority: administrative beats OLT beats raw router data.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Crm,
    Olt,
    Router,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchHit {
    pub username: String,
    pub display_name: String,
    pub address: String,
    pub customer_id: Option<i64>,
    pub source: SearchSource,
    pub mac: Option<String>,
}

/// Flat, fully-populated diagnosis record.
///
/// Every field carries a value; data absent from all sources shows up as an
/// explicit sentinel so downstream consumers see a stable schema.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Diagnosis {
    pub pppoe_username: String,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub address: String,
    pub plan_name: String,
    pub plan_speed: String,
    pub node_id: String,
    pub node_name: String,
    pub node_ip: String,
    pub node_port: u16,
    pub onu_external_id: String,
    pub onu_serial: String,
    pub olt_name: String,
    pub board: String,
    pub port: String,
    pub onu: String,
    pub onu_mode: String,
    pub router_ip: String,
    pub router_profile: String,
    pub mac: String,
    pub last_logout: String,
    pub comment: String,
}

/// Sentinel for usernames no source can attach a display name to.
pub const UNLINKED: &str = "Unlinked";
/// Sentinel for fields absent from every source.
pub const UNKNOWN: &str = "Unknown";
/// Sentinel for fields the owning source does not track.
pub const NOT_AVAILABLE: &str = "N/A";
