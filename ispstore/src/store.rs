use crate::config::StoreConfig;
use crate::errors::Result;
use crate::models::{
    Connection as PppConnection, Customer, CustomerBundle, Node, Plan, RouterAccount, SyncOutcome,
    SyncStatus, TechnicalSubscriber,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// Normalized cache of the four source entities plus the sync audit log.
///
/// All writes go through the sync orchestrator; the reconciliation engine
/// only reads. Each full-table replacement runs inside one transaction so a
/// crash mid-sync never leaves a table half-populated.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    default_router_port: u16,
}

/// Search projection of Connection joined to Customer.
#[derive(Debug, Clone)]
pub struct AdminSearchRow {
    pub username: String,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub customer_id: Option<i64>,
}

/// Search projection of a raw router AAA entry.
#[derive(Debug, Clone)]
pub struct RouterSearchRow {
    pub username: String,
    pub comment: Option<String>,
    pub caller_id: Option<String>,
}

/// Search projection of an OLT provisioning record.
#[derive(Debug, Clone)]
pub struct TechSearchRow {
    pub username: String,
    pub serial: String,
    pub olt_name: String,
}

/// The administrative join used as the authoritative diagnosis path.
#[derive(Debug, Clone)]
pub struct AdminRecord {
    pub connection: PppConnection,
    pub customer: Option<Customer>,
    pub node: Option<Node>,
    pub plan: Option<Plan>,
}

impl Store {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            default_router_port: config.default_router_port,
        })
    }

    pub fn default_router_port(&self) -> u16 {
        self.default_router_port
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS nodes (
                node_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                ip_address TEXT,
                api_port INTEGER
            );
            CREATE TABLE IF NOT EXISTS technical_subscribers (
                external_id TEXT PRIMARY KEY,
                serial TEXT NOT NULL,
                olt_name TEXT NOT NULL,
                olt_id TEXT NOT NULL,
                board TEXT NOT NULL,
                port TEXT NOT NULL,
                onu TEXT NOT NULL,
                onu_type TEXT NOT NULL,
                pppoe_username TEXT NOT NULL,
                mode TEXT NOT NULL,
                node_id TEXT,
                connection_id INTEGER
            );
            CREATE TABLE IF NOT EXISTS customers (
                customer_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                doc_number TEXT,
                billing_status TEXT,
                address TEXT
            );
            CREATE TABLE IF NOT EXISTS customer_emails (
                customer_id INTEGER NOT NULL,
                email TEXT NOT NULL,
                PRIMARY KEY (customer_id, email)
            );
            CREATE TABLE IF NOT EXISTS customer_phones (
                customer_id INTEGER NOT NULL,
                phone TEXT NOT NULL,
                PRIMARY KEY (customer_id, phone)
            );
            CREATE TABLE IF NOT EXISTS connections (
                connection_id INTEGER PRIMARY KEY,
                pppoe_username TEXT NOT NULL,
                customer_id INTEGER,
                node_id TEXT,
                plan_id INTEGER,
                address TEXT
            );
            CREATE TABLE IF NOT EXISTS plans (
                plan_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                speed TEXT,
                description TEXT
            );
            CREATE TABLE IF NOT EXISTS router_accounts (
                username TEXT NOT NULL,
                router_ip TEXT NOT NULL,
                password TEXT,
                profile TEXT,
                caller_id TEXT,
                comment TEXT,
                last_logout TEXT,
                PRIMARY KEY (username, router_ip)
            );
            CREATE TABLE IF NOT EXISTS sync_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                synced_at TEXT NOT NULL,
                outcome TEXT NOT NULL,
                detail TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_connections_username
                ON connections (pppoe_username COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_technical_username
                ON technical_subscribers (pppoe_username COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_router_accounts_username
                ON router_accounts (username COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_sync_status_source_time
                ON sync_status (source, synced_at);
            COMMIT;",
        )?;
        Ok(())
    }

    // --- Sync writes (owned by the orchestrator) ---

    /// Upserts the given nodes and sweeps rows absent from the new pull.
    /// Callers must not pass an empty slice; an empty fetch is logged and
    /// skipped upstream so an outage never wipes good data.
    pub fn replace_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO nodes (node_id, name, ip_address, api_port)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(node_id) DO UPDATE SET
                    name = excluded.name,
                    ip_address = excluded.ip_address,
                    api_port = excluded.api_port",
            )?;
            for node in nodes {
                mark.execute(params![node.node_id])?;
                upsert.execute(params![
                    node.node_id,
                    node.name,
                    node.ip_address,
                    node.api_port,
                ])?;
            }
        }
        tx.execute(
            "DELETE FROM nodes WHERE node_id NOT IN (SELECT k FROM incoming_keys)",
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn replace_plans(&self, plans: &[Plan]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO plans (plan_id, name, speed, description)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(plan_id) DO UPDATE SET
                    name = excluded.name,
                    speed = excluded.speed,
                    description = excluded.description",
            )?;
            for plan in plans {
                mark.execute(params![plan.plan_id.to_string()])?;
                upsert.execute(params![plan.plan_id, plan.name, plan.speed, plan.description])?;
            }
        }
        tx.execute(
            "DELETE FROM plans WHERE CAST(plan_id AS TEXT) NOT IN (SELECT k FROM incoming_keys)",
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Upserts connections; sweeps stale rows only for a complete pull so a
    /// pagination loop that stopped early retains the tail it never reached.
    pub fn replace_connections(&self, connections: &[PppConnection], sweep_stale: bool) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO connections (connection_id, pppoe_username, customer_id, node_id, plan_id, address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(connection_id) DO UPDATE SET
                    pppoe_username = excluded.pppoe_username,
                    customer_id = excluded.customer_id,
                    node_id = excluded.node_id,
                    plan_id = excluded.plan_id,
                    address = excluded.address",
            )?;
            for record in connections {
                mark.execute(params![record.connection_id.to_string()])?;
                upsert.execute(params![
                    record.connection_id,
                    record.pppoe_username,
                    record.customer_id,
                    record.node_id,
                    record.plan_id,
                    record.address,
                ])?;
            }
        }
        if sweep_stale {
            tx.execute(
                "DELETE FROM connections
                 WHERE CAST(connection_id AS TEXT) NOT IN (SELECT k FROM incoming_keys)",
                [],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn replace_technical_subscribers(&self, subscribers: &[TechnicalSubscriber]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO technical_subscribers
                    (external_id, serial, olt_name, olt_id, board, port, onu, onu_type, pppoe_username, mode)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(external_id) DO UPDATE SET
                    serial = excluded.serial,
                    olt_name = excluded.olt_name,
                    olt_id = excluded.olt_id,
                    board = excluded.board,
                    port = excluded.port,
                    onu = excluded.onu,
                    onu_type = excluded.onu_type,
                    pppoe_username = excluded.pppoe_username,
                    mode = excluded.mode",
            )?;
            for sub in subscribers {
                mark.execute(params![sub.external_id])?;
                upsert.execute(params![
                    sub.external_id,
                    sub.serial,
                    sub.olt_name,
                    sub.olt_id,
                    sub.board,
                    sub.port,
                    sub.onu,
                    sub.onu_type,
                    sub.pppoe_username,
                    sub.mode,
                ])?;
            }
        }
        tx.execute(
            "DELETE FROM technical_subscribers
             WHERE external_id NOT IN (SELECT k FROM incoming_keys)",
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn replace_customers(&self, bundles: &[CustomerBundle], sweep_stale: bool) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO customers (customer_id, name, doc_number, billing_status, address)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(customer_id) DO UPDATE SET
                    name = excluded.name,
                    doc_number = excluded.doc_number,
                    billing_status = excluded.billing_status,
                    address = excluded.address",
            )?;
            let mut clear_emails =
                tx.prepare("DELETE FROM customer_emails WHERE customer_id = ?1")?;
            let mut clear_phones =
                tx.prepare("DELETE FROM customer_phones WHERE customer_id = ?1")?;
            let mut add_email = tx.prepare(
                "INSERT OR IGNORE INTO customer_emails (customer_id, email) VALUES (?1, ?2)",
            )?;
            let mut add_phone = tx.prepare(
                "INSERT OR IGNORE INTO customer_phones (customer_id, phone) VALUES (?1, ?2)",
            )?;
            for bundle in bundles {
                let customer = &bundle.customer;
                mark.execute(params![customer.customer_id.to_string()])?;
                upsert.execute(params![
                    customer.customer_id,
                    customer.name,
                    customer.doc_number,
                    customer.billing_status,
                    customer.address,
                ])?;
                clear_emails.execute(params![customer.customer_id])?;
                clear_phones.execute(params![customer.customer_id])?;
                for email in &bundle.contacts.emails {
                    add_email.execute(params![customer.customer_id, email])?;
                }
                for phone in &bundle.contacts.phones {
                    add_phone.execute(params![customer.customer_id, phone])?;
                }
            }
        }
        if sweep_stale {
            tx.execute(
                "DELETE FROM customer_emails
                 WHERE CAST(customer_id AS TEXT) NOT IN (SELECT k FROM incoming_keys)",
                [],
            )?;
            tx.execute(
                "DELETE FROM customer_phones
                 WHERE CAST(customer_id AS TEXT) NOT IN (SELECT k FROM incoming_keys)",
                [],
            )?;
            tx.execute(
                "DELETE FROM customers
                 WHERE CAST(customer_id AS TEXT) NOT IN (SELECT k FROM incoming_keys)",
                [],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Replaces the AAA entries of one router. The sweep is scoped to that
    /// router's IP, so a router that failed to answer this cycle keeps its
    /// previously synced rows.
    pub fn replace_router_accounts(&self, router_ip: &str, accounts: &[RouterAccount]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS incoming_keys (k TEXT PRIMARY KEY);
             DELETE FROM incoming_keys;",
        )?;
        {
            let mut mark = tx.prepare("INSERT OR IGNORE INTO incoming_keys (k) VALUES (?1)")?;
            let mut upsert = tx.prepare(
                "INSERT INTO router_accounts
                    (username, router_ip, password, profile, caller_id, comment, last_logout)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(username, router_ip) DO UPDATE SET
                    password = excluded.password,
                    profile = excluded.profile,
                    caller_id = excluded.caller_id,
                    comment = excluded.comment,
                    last_logout = excluded.last_logout",
            )?;
            for account in accounts {
                mark.execute(params![account.username])?;
                upsert.execute(params![
                    account.username,
                    router_ip,
                    account.password,
                    account.profile,
                    account.caller_id,
                    account.comment,
                    account.last_logout,
                ])?;
            }
        }
        tx.execute(
            "DELETE FROM router_accounts
             WHERE router_ip = ?1 AND username NOT IN (SELECT k FROM incoming_keys)",
            params![router_ip],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Cross-reference pass: attach each technical record to the connection
    /// and node serving its PPPoE username. Case-insensitive on purpose; the
    /// CRM and the OLT platform disagree about username casing.
    pub fn match_connections(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE technical_subscribers
             SET node_id = (
                    SELECT c.node_id FROM connections c
                    WHERE c.pppoe_username = technical_subscribers.pppoe_username COLLATE NOCASE
                 ),
                 connection_id = (
                    SELECT c.connection_id FROM connections c
                    WHERE c.pppoe_username = technical_subscribers.pppoe_username COLLATE NOCASE
                 )",
            [],
        )?;
        Ok(updated)
    }

    pub fn log_sync_status(&self, source: &str, outcome: SyncOutcome, detail: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sync_status (source, synced_at, outcome, detail) VALUES (?1, ?2, ?3, ?4)",
            params![source, chrono::Utc::now().to_rfc3339(), outcome.as_str(), detail],
        )?;
        Ok(())
    }

    /// The most recent audit row per source.
    pub fn latest_sync_status(&self) -> Result<Vec<SyncStatus>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, source, synced_at, outcome, detail FROM sync_status
             WHERE id IN (SELECT MAX(id) FROM sync_status GROUP BY source)
             ORDER BY source",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SyncStatus {
                id: row.get(0)?,
                source: row.get(1)?,
                synced_at: row.get(2)?,
                outcome: row.get(3)?,
                detail: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // --- Reads for the reconciliation engine ---

    pub fn nodes(&self) -> Result<Vec<Node>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT node_id, name, ip_address, api_port FROM nodes ORDER BY node_id")?;
        let rows = stmt.query_map([], map_node)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn node_by_ip(&self, ip: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT node_id, name, ip_address, api_port FROM nodes WHERE ip_address = ?1",
            params![ip],
            map_node,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn admin_record(&self, username: &str) -> Result<Option<AdminRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT co.connection_id, co.pppoe_username, co.customer_id, co.node_id, co.plan_id, co.address,
                    cu.customer_id, cu.name, cu.doc_number, cu.billing_status, cu.address,
                    n.node_id, n.name, n.ip_address, n.api_port,
                    p.plan_id, p.name, p.speed, p.description
             FROM connections co
             LEFT JOIN customers cu ON cu.customer_id = co.customer_id
             LEFT JOIN nodes n ON n.node_id = co.node_id
             LEFT JOIN plans p ON p.plan_id = co.plan_id
             WHERE co.pppoe_username = ?1 COLLATE NOCASE",
            params![username],
            |row| {
                let connection = PppConnection {
                    connection_id: row.get(0)?,
                    pppoe_username: row.get(1)?,
                    customer_id: row.get(2)?,
                    node_id: row.get(3)?,
                    plan_id: row.get(4)?,
                    address: row.get(5)?,
                };
                let customer = match row.get::<_, Option<i64>>(6)? {
                    Some(customer_id) => Some(Customer {
                        customer_id,
                        name: row.get(7)?,
                        doc_number: row.get(8)?,
                        billing_status: row.get(9)?,
                        address: row.get(10)?,
                    }),
                    None => None,
                };
                let node = match row.get::<_, Option<String>>(11)? {
                    Some(node_id) => Some(Node {
                        node_id,
                        name: row.get(12)?,
                        ip_address: row.get(13)?,
                        api_port: row.get(14)?,
                    }),
                    None => None,
                };
                let plan = match row.get::<_, Option<i64>>(15)? {
                    Some(plan_id) => Some(Plan {
                        plan_id,
                        name: row.get(16)?,
                        speed: row.get(17)?,
                        description: row.get(18)?,
                    }),
                    None => None,
                };
                Ok(AdminRecord {
                    connection,
                    customer,
                    node,
                    plan,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn technical_by_username(&self, username: &str) -> Result<Option<TechnicalSubscriber>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT external_id, serial, olt_name, olt_id, board, port, onu, onu_type, pppoe_username, mode
             FROM technical_subscribers
             WHERE pppoe_username = ?1 COLLATE NOCASE",
            params![username],
            map_technical,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn router_accounts_by_username(&self, username: &str) -> Result<Vec<RouterAccount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT username, router_ip, password, profile, caller_id, comment, last_logout
             FROM router_accounts
             WHERE username = ?1 COLLATE NOCASE
             ORDER BY router_ip",
        )?;
        let rows = stmt.query_map(params![username], map_router_account)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn search_admin(&self, fragment: &str, limit: usize) -> Result<Vec<AdminSearchRow>> {
        let pattern = like_pattern(fragment);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT co.pppoe_username, cu.name, COALESCE(co.address, cu.address), co.customer_id
             FROM connections co
             LEFT JOIN customers cu ON cu.customer_id = co.customer_id
             WHERE co.pppoe_username LIKE ?1 ESCAPE '\\'
                OR cu.name LIKE ?1 ESCAPE '\\'
                OR co.address LIKE ?1 ESCAPE '\\'
                OR cu.address LIKE ?1 ESCAPE '\\'
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(AdminSearchRow {
                username: row.get(0)?,
                customer_name: row.get(1)?,
                address: row.get(2)?,
                customer_id: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn search_router(&self, fragment: &str, limit: usize) -> Result<Vec<RouterSearchRow>> {
        let pattern = like_pattern(fragment);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT username, comment, caller_id FROM router_accounts
             WHERE username LIKE ?1 ESCAPE '\\'
                OR comment LIKE ?1 ESCAPE '\\'
                OR caller_id LIKE ?1 ESCAPE '\\'
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(RouterSearchRow {
                username: row.get(0)?,
                comment: row.get(1)?,
                caller_id: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn search_technical(&self, fragment: &str, limit: usize) -> Result<Vec<TechSearchRow>> {
        let pattern = like_pattern(fragment);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT pppoe_username, serial, olt_name FROM technical_subscribers
             WHERE pppoe_username LIKE ?1 ESCAPE '\\'
                OR serial LIKE ?1 ESCAPE '\\'
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(TechSearchRow {
                username: row.get(0)?,
                serial: row.get(1)?,
                olt_name: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self, table: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let sql = match table {
            "nodes" => "SELECT COUNT(*) FROM nodes",
            "technical_subscribers" => "SELECT COUNT(*) FROM technical_subscribers",
            "customers" => "SELECT COUNT(*) FROM customers",
            "connections" => "SELECT COUNT(*) FROM connections",
            "plans" => "SELECT COUNT(*) FROM plans",
            "router_accounts" => "SELECT COUNT(*) FROM router_accounts",
            "sync_status" => "SELECT COUNT(*) FROM sync_status",
            other => {
                return Err(crate::errors::StoreError::Config(format!(
                    "unknown table '{other}'"
                )))
            }
        };
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}

fn map_node(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        node_id: row.get(0)?,
        name: row.get(1)?,
        ip_address: row.get(2)?,
        api_port: row.get(3)?,
    })
}

fn map_technical(row: &Row<'_>) -> rusqlite::Result<TechnicalSubscriber> {
    Ok(TechnicalSubscriber {
        external_id: row.get(0)?,
        serial: row.get(1)?,
        olt_name: row.get(2)?,
        olt_id: row.get(3)?,
        board: row.get(4)?,
        port: row.get(5)?,
        onu: row.get(6)?,
        onu_type: row.get(7)?,
        pppoe_username: row.get(8)?,
        mode: row.get(9)?,
    })
}

fn map_router_account(row: &Row<'_>) -> rusqlite::Result<RouterAccount> {
    Ok(RouterAccount {
        username: row.get(0)?,
        router_ip: row.get(1)?,
        password: row.get(2)?,
        profile: row.get(3)?,
        caller_id: row.get(4)?,
        comment: row.get(5)?,
        last_logout: row.get(6)?,
    })
}

/// `LIKE` pattern with `%`/`_` escaped so a fragment is matched literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
