use crate::errors::Result;
use crate::models::{
    Connection, CustomerBundle, Node, Plan, RouterAccount, SyncOutcome, TechnicalSubscriber,
};
use crate::store::Store;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Failure taxonomy shared by every upstream source. Token expiry is handled
/// inside the clients (one refresh + replay) and only escalates here as
/// `Auth` once the replay failed too.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("upstream timed out: {0}")]
    Timeout(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Records accumulated by a bulk pull. `partial` carries the stop reason
/// when a pagination loop ended early; partial results are preferable to
/// none for a nightly batch job.
#[derive(Debug)]
pub struct Pull<T> {
    pub records: Vec<T>,
    pub partial: Option<String>,
}

impl<T> Pull<T> {
    pub fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            partial: None,
        }
    }

    pub fn truncated(records: Vec<T>, reason: impl Into<String>) -> Self {
        Self {
            records,
            partial: Some(reason.into()),
        }
    }
}

/// The administrative (billing/CRM) platform.
#[async_trait]
pub trait AdminSource: Send + Sync {
    async fn nodes(&self) -> SourceResult<Vec<Node>>;
    async fn plans(&self) -> SourceResult<Vec<Plan>>;
    /// Full connection list, defensively paginated client-side.
    async fn connections(&self) -> SourceResult<Pull<Connection>>;
    /// Paginated customer list; each record bundles the contact sub-lists.
    async fn customers(&self) -> SourceResult<Pull<CustomerBundle>>;
}

/// The fiber-OLT provisioning platform.
#[async_trait]
pub trait OltSource: Send + Sync {
    async fn subscribers(&self) -> SourceResult<Vec<TechnicalSubscriber>>;
}

/// One access router's AAA table, addressed by management IP and port.
#[async_trait]
pub trait RouterSource: Send + Sync {
    async fn accounts(&self, host: &str, port: u16) -> SourceResult<Vec<RouterAccount>>;
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound on routers polled concurrently.
    pub router_concurrency: usize,
    /// Budget for one router's AAA pull; expiry counts as a fetch failure.
    pub router_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            router_concurrency: 8,
            router_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct StepReport {
    pub source: String,
    pub outcome: SyncOutcome,
    pub records: usize,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct SyncReport {
    pub steps: Vec<StepReport>,
    pub cross_references: usize,
}

/// Pulls the three upstreams into the local store in dependency order.
///
/// Nodes come first so router IPs are known before polling, then router AAA
/// tables per node, then the OLT listing, then the CRM entities. Every step
/// is independently fault-tolerant: a failed step is logged to the audit
/// table and never aborts the steps after it.
pub struct SyncOrchestrator {
    store: Arc<Store>,
    admin: Arc<dyn AdminSource>,
    olt: Arc<dyn OltSource>,
    routers: Arc<dyn RouterSource>,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<Store>,
        admin: Arc<dyn AdminSource>,
        olt: Arc<dyn OltSource>,
        routers: Arc<dyn RouterSource>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            admin,
            olt,
            routers,
            options,
        }
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        report.steps.push(self.sync_nodes().await?);
        report.steps.push(self.sync_router_accounts().await?);
        report.steps.push(self.sync_technical_subscribers().await?);
        report.steps.push(self.sync_plans().await?);
        report.steps.push(self.sync_connections().await?);
        report.steps.push(self.sync_customers().await?);

        report.cross_references = self.store.match_connections()?;
        log::info!(
            "sync finished: {} cross-references recomputed",
            report.cross_references
        );
        Ok(report)
    }

    async fn sync_nodes(&self) -> Result<StepReport> {
        match self.admin.nodes().await {
            Ok(nodes) if nodes.is_empty() => self.finish_step("nodes", SyncOutcome::Empty, 0, None),
            Ok(nodes) => {
                self.store.replace_nodes(&nodes)?;
                self.finish_step("nodes", SyncOutcome::Ok, nodes.len(), None)
            }
            Err(err) => self.finish_step("nodes", SyncOutcome::Error, 0, Some(err.to_string())),
        }
    }

    /// Fans out over the known nodes with a bounded worker pool. Failures
    /// are isolated per router; a stalled router costs one timeout, not the
    /// whole sync.
    async fn sync_router_accounts(&self) -> Result<StepReport> {
        let nodes: Vec<Node> = self
            .store
            .nodes()?
            .into_iter()
            .filter(|node| node.ip_address.as_deref().is_some_and(|ip| !ip.is_empty()))
            .collect();
        if nodes.is_empty() {
            return self.finish_step("routers", SyncOutcome::Empty, 0, Some("no nodes with a management IP".into()));
        }

        let default_port = self.store.default_router_port();
        let mut pending = nodes.into_iter();
        let mut tasks: JoinSet<(String, SourceResult<Vec<RouterAccount>>)> = JoinSet::new();
        let mut total_accounts = 0usize;
        let mut routers_ok = 0usize;
        let mut routers_empty = 0usize;
        let mut failures: Vec<String> = Vec::new();

        loop {
            while tasks.len() < self.options.router_concurrency {
                let Some(node) = pending.next() else { break };
                let ip = node.ip_address.clone().unwrap_or_default();
                let port = node.api_port.unwrap_or(default_port);
                let source = Arc::clone(&self.routers);
                let timeout = self.options.router_timeout;
                tasks.spawn(async move {
                    let pulled = match tokio::time::timeout(timeout, source.accounts(&ip, port)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(SourceError::Timeout(format!(
                            "router {ip}:{port} did not answer within {timeout:?}"
                        ))),
                    };
                    (ip, pulled)
                });
            }

            let Some(joined) = tasks.join_next().await else { break };
            let (ip, pulled) = match joined {
                Ok(result) => result,
                Err(err) => {
                    failures.push(format!("router task failed: {err}"));
                    continue;
                }
            };
            match pulled {
                Ok(accounts) if accounts.is_empty() => {
                    log::warn!("router {ip}: empty AAA table, keeping previous rows");
                    routers_empty += 1;
                }
                Ok(accounts) => {
                    total_accounts += accounts.len();
                    self.store.replace_router_accounts(&ip, &accounts)?;
                    routers_ok += 1;
                }
                Err(err) => {
                    log::warn!("router {ip}: {err}");
                    failures.push(format!("{ip}: {err}"));
                }
            }
        }

        let detail = format!(
            "{routers_ok} routers ok, {routers_empty} empty, {} failed",
            failures.len()
        );
        let outcome = if routers_ok == 0 && !failures.is_empty() {
            SyncOutcome::Error
        } else if failures.is_empty() {
            SyncOutcome::Ok
        } else {
            SyncOutcome::Partial
        };
        self.finish_step("routers", outcome, total_accounts, Some(detail))
    }

    async fn sync_technical_subscribers(&self) -> Result<StepReport> {
        match self.olt.subscribers().await {
            Ok(subs) if subs.is_empty() => self.finish_step("olt", SyncOutcome::Empty, 0, None),
            Ok(subs) => {
                self.store.replace_technical_subscribers(&subs)?;
                self.finish_step("olt", SyncOutcome::Ok, subs.len(), None)
            }
            Err(err) => self.finish_step("olt", SyncOutcome::Error, 0, Some(err.to_string())),
        }
    }

    async fn sync_plans(&self) -> Result<StepReport> {
        match self.admin.plans().await {
            Ok(plans) if plans.is_empty() => self.finish_step("plans", SyncOutcome::Empty, 0, None),
            Ok(plans) => {
                self.store.replace_plans(&plans)?;
                self.finish_step("plans", SyncOutcome::Ok, plans.len(), None)
            }
            Err(err) => self.finish_step("plans", SyncOutcome::Error, 0, Some(err.to_string())),
        }
    }

    async fn sync_connections(&self) -> Result<StepReport> {
        match self.admin.connections().await {
            Ok(pull) if pull.records.is_empty() => {
                self.finish_step("connections", SyncOutcome::Empty, 0, pull.partial)
            }
            Ok(pull) => {
                let complete = pull.partial.is_none();
                self.store.replace_connections(&pull.records, complete)?;
                let outcome = if complete {
                    SyncOutcome::Ok
                } else {
                    SyncOutcome::Partial
                };
                self.finish_step("connections", outcome, pull.records.len(), pull.partial)
            }
            Err(err) => {
                self.finish_step("connections", SyncOutcome::Error, 0, Some(err.to_string()))
            }
        }
    }

    async fn sync_customers(&self) -> Result<StepReport> {
        match self.admin.customers().await {
            Ok(pull) if pull.records.is_empty() => {
                self.finish_step("customers", SyncOutcome::Empty, 0, pull.partial)
            }
            Ok(pull) => {
                let complete = pull.partial.is_none();
                self.store.replace_customers(&pull.records, complete)?;
                let outcome = if complete {
                    SyncOutcome::Ok
                } else {
                    SyncOutcome::Partial
                };
                self.finish_step("customers", outcome, pull.records.len(), pull.partial)
            }
            Err(err) => {
                self.finish_step("customers", SyncOutcome::Error, 0, Some(err.to_string()))
            }
        }
    }

    fn finish_step(
        &self,
        source: &str,
        outcome: SyncOutcome,
        records: usize,
        detail: Option<String>,
    ) -> Result<StepReport> {
        match outcome {
            SyncOutcome::Ok => log::info!("[sync] {source}: {records} records"),
            SyncOutcome::Partial => log::warn!(
                "[sync] {source}: partial, kept {records} records ({})",
                detail.as_deref().unwrap_or("no detail")
            ),
            SyncOutcome::Empty => {
                log::warn!("[sync] {source}: upstream returned nothing, previous data retained")
            }
            SyncOutcome::Error => log::error!(
                "[sync] {source}: {}",
                detail.as_deref().unwrap_or("unknown failure")
            ),
        }
        let summary = match (&detail, records) {
            (Some(detail), 0) => detail.clone(),
            (Some(detail), n) => format!("{n} records; {detail}"),
            (None, n) => format!("{n} records"),
        };
        self.store.log_sync_status(source, outcome, Some(&summary))?;
        Ok(StepReport {
            source: source.to_string(),
            outcome,
            records,
            detail,
        })
    }
}
