use crate::errors::Result;
use crate::models::{
    Diagnosis, Node, RouterAccount, SearchHit, SearchSource, NOT_AVAILABLE, UNKNOWN, UNLINKED,
};
use crate::store::{AdminRecord, Store};
use std::collections::HashMap;
use std::sync::Arc;

/// Queries shorter than this never touch the store.
pub const MIN_QUERY_LEN: usize = 3;
/// Interactive search is capped to keep latency flat on broad fragments.
pub const MAX_SEARCH_HITS: usize = 30;

/// Read-only reconciliation over the local store: subscriber search across
/// the three sources, and priority-ordered diagnosis with router-identity
/// resolution. Never mutates store data.
pub struct SubscriberDirectory {
    store: Arc<Store>,
}

impl SubscriberDirectory {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Fuzzy multi-source search, deduplicated by username.
    ///
    /// Each source is queried independently and tagged; when the same
    /// username shows up from several sources only the highest-priority tag
    /// survives (crm > olt > router).
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.len() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let mut by_username: HashMap<String, SearchHit> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        let admin = self.store.search_admin(query, MAX_SEARCH_HITS)?;
        for row in admin {
            let hit = SearchHit {
                username: row.username.clone(),
                display_name: non_empty(row.customer_name).unwrap_or_else(|| UNLINKED.to_string()),
                address: non_empty(row.address).unwrap_or_else(|| UNKNOWN.to_string()),
                customer_id: row.customer_id,
                source: SearchSource::Crm,
                mac: None,
            };
            merge_hit(&mut by_username, &mut order, hit);
        }

        let technical = self.store.search_technical(query, MAX_SEARCH_HITS)?;
        for row in technical {
            let hit = SearchHit {
                username: row.username.clone(),
                display_name: format!("{} @ {}", row.serial, row.olt_name),
                address: UNKNOWN.to_string(),
                customer_id: None,
                source: SearchSource::Olt,
                mac: None,
            };
            merge_hit(&mut by_username, &mut order, hit);
        }

        let router = self.store.search_router(query, MAX_SEARCH_HITS)?;
        for row in router {
            let hit = SearchHit {
                username: row.username.clone(),
                display_name: non_empty(row.comment).unwrap_or_else(|| UNLINKED.to_string()),
                address: UNKNOWN.to_string(),
                customer_id: None,
                source: SearchSource::Router,
                mac: non_empty(row.caller_id),
            };
            merge_hit(&mut by_username, &mut order, hit);
        }

        let mut hits: Vec<SearchHit> = order
            .into_iter()
            .filter_map(|key| by_username.remove(&key))
            .collect();
        hits.truncate(MAX_SEARCH_HITS);
        Ok(hits)
    }

    /// Priority-ordered fallback diagnosis for one PPPoE username.
    ///
    /// The administrative record is authoritative when it exists; otherwise
    /// a partial record is assembled from the technical and router sources.
    /// `None` means no source knows the username.
    pub fn diagnose(&self, username: &str) -> Result<Option<Diagnosis>> {
        let accounts = self.store.router_accounts_by_username(username)?;

        if let Some(admin) = self.store.admin_record(username)? {
            return Ok(Some(self.diagnose_administrative(admin, &accounts)?));
        }

        let technical = self.store.technical_by_username(username)?;
        if technical.is_none() && accounts.is_empty() {
            return Ok(None);
        }

        let mut record = blank_diagnosis(username);
        if let Some(sub) = technical {
            record.pppoe_username = sub.pppoe_username.clone();
            record.onu_external_id = sub.external_id;
            record.onu_serial = sub.serial;
            record.olt_name = sub.olt_name;
            record.board = sub.board;
            record.port = sub.port;
            record.onu = sub.onu;
            record.onu_mode = sub.mode;
        }
        if let Some(account) = pick_router_account(&accounts, None) {
            self.overlay_router_identity(&mut record, account, None)?;
        }
        Ok(Some(record))
    }

    /// Administrative path: full join plus the drift-correction rule. When a
    /// router reports the username from a different IP than the node on
    /// file, the live router wins and the node fields are re-resolved by IP.
    fn diagnose_administrative(
        &self,
        admin: AdminRecord,
        accounts: &[RouterAccount],
    ) -> Result<Diagnosis> {
        let mut record = blank_diagnosis(&admin.connection.pppoe_username);
        record.customer_id = admin.connection.customer_id;

        if let Some(customer) = &admin.customer {
            record.customer_id = Some(customer.customer_id);
            record.customer_name = non_empty(Some(customer.name.clone()))
                .unwrap_or_else(|| UNLINKED.to_string());
            if let Some(address) = non_empty(customer.address.clone()) {
                record.address = address;
            }
        }
        // The installation address on the connection beats the billing one.
        if let Some(address) = non_empty(admin.connection.address.clone()) {
            record.address = address;
        }
        if let Some(plan) = &admin.plan {
            record.plan_name = plan.name.clone();
            if let Some(speed) = non_empty(plan.speed.clone()) {
                record.plan_speed = speed;
            }
        }
        let admin_node_ip = admin.node.as_ref().and_then(|n| n.ip_address.clone());
        if let Some(node) = &admin.node {
            self.apply_node(&mut record, node);
        }

        if let Some(sub) = self.store.technical_by_username(&admin.connection.pppoe_username)? {
            record.onu_external_id = sub.external_id;
            record.onu_serial = sub.serial;
            record.olt_name = sub.olt_name;
            record.board = sub.board;
            record.port = sub.port;
            record.onu = sub.onu;
            record.onu_mode = sub.mode;
        }

        if let Some(account) = pick_router_account(accounts, admin_node_ip.as_deref()) {
            self.overlay_router_identity(&mut record, account, admin_node_ip.as_deref())?;
        }

        Ok(record)
    }

    /// Copies router AAA fields into the record and resolves the node the
    /// router IP actually belongs to, synthesizing a placeholder when the IP
    /// matches no known node.
    fn overlay_router_identity(
        &self,
        record: &mut Diagnosis,
        account: &RouterAccount,
        admin_node_ip: Option<&str>,
    ) -> Result<()> {
        record.router_ip = account.router_ip.clone();
        if let Some(profile) = non_empty(account.profile.clone()) {
            record.router_profile = profile;
        }
        if let Some(mac) = non_empty(account.caller_id.clone()) {
            record.mac = mac;
        }
        if let Some(last_logout) = non_empty(account.last_logout.clone()) {
            record.last_logout = last_logout;
        }
        if let Some(comment) = non_empty(account.comment.clone()) {
            record.comment = comment;
        }

        let drifted = admin_node_ip != Some(account.router_ip.as_str());
        if drifted || admin_node_ip.is_none() {
            let node = self
                .store
                .node_by_ip(&account.router_ip)?
                .unwrap_or_else(|| placeholder_node(&account.router_ip));
            self.apply_node(record, &node);
        }
        Ok(())
    }

    fn apply_node(&self, record: &mut Diagnosis, node: &Node) {
        record.node_id = if node.node_id.is_empty() {
            UNKNOWN.to_string()
        } else {
            node.node_id.clone()
        };
        record.node_name = node.name.clone();
        if let Some(ip) = non_empty(node.ip_address.clone()) {
            record.node_ip = ip;
        }
        record.node_port = node.api_port.unwrap_or_else(|| self.store.default_router_port());
    }
}

/// A real, reachable router whose IP the node inventory does not know yet.
fn placeholder_node(ip: &str) -> Node {
    Node {
        node_id: String::new(),
        name: format!("Unnamed router {ip}"),
        ip_address: Some(ip.to_string()),
        api_port: None,
    }
}

/// When a username has AAA entries on several routers, the one matching the
/// administratively assigned node wins; any first entry is an acceptable
/// default otherwise.
fn pick_router_account<'a>(
    accounts: &'a [RouterAccount],
    admin_node_ip: Option<&str>,
) -> Option<&'a RouterAccount> {
    if let Some(ip) = admin_node_ip {
        if let Some(matching) = accounts.iter().find(|a| a.router_ip == ip) {
            return Some(matching);
        }
    }
    accounts.first()
}

fn merge_hit(
    by_username: &mut HashMap<String, SearchHit>,
    order: &mut Vec<String>,
    hit: SearchHit,
) {
    let key = hit.username.to_lowercase();
    match by_username.get(&key) {
        Some(existing) if existing.source <= hit.source => {}
        Some(_) => {
            by_username.insert(key, hit);
        }
        None => {
            by_username.insert(key.clone(), hit);
            order.push(key);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn blank_diagnosis(username: &str) -> Diagnosis {
    Diagnosis {
        pppoe_username: username.to_string(),
        customer_id: None,
        customer_name: UNLINKED.to_string(),
        address: UNKNOWN.to_string(),
        plan_name: UNKNOWN.to_string(),
        plan_speed: UNKNOWN.to_string(),
        node_id: UNKNOWN.to_string(),
        node_name: UNKNOWN.to_string(),
        node_ip: UNKNOWN.to_string(),
        node_port: 0,
        onu_external_id: NOT_AVAILABLE.to_string(),
        onu_serial: NOT_AVAILABLE.to_string(),
        olt_name: NOT_AVAILABLE.to_string(),
        board: NOT_AVAILABLE.to_string(),
        port: NOT_AVAILABLE.to_string(),
        onu: NOT_AVAILABLE.to_string(),
        onu_mode: NOT_AVAILABLE.to_string(),
        router_ip: UNKNOWN.to_string(),
        router_profile: UNKNOWN.to_string(),
        mac: UNKNOWN.to_string(),
        last_logout: UNKNOWN.to_string(),
        comment: String::new(),
    }
}
