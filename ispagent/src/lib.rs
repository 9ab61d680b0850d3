use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::{Args, Parser, Subcommand};
use crmfetcher::{AdminClient, Credentials};
use ispstore::{
    models::{Diagnosis, SearchHit, SyncStatus, NOT_AVAILABLE, UNKNOWN},
    StoreConfig, SubscriberDirectory, SyncOptions, SyncOrchestrator,
};
use oltfetcher::OltClient;
use routerfetcher::{RouterCredentials, RouterFleet};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

type Store = ispstore::Store;

/// Runs the command line interface for the subscriber diagnosis service.
pub async fn run_cli() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_server(args).await?,
        Command::Sync(args) => run_sync(args).await?,
        Command::Probe(args) => run_probe(args).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Starts the HTTP query service (pure reads against the local store)
    Serve(ServeArgs),
    /// Runs one full pull from the three upstreams into the local store
    Sync(SyncArgs),
    /// Live probe of one subscriber: stored diagnosis plus upstream checks
    Probe(ProbeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Base directory for the local store
    #[arg(long, env = "ISPAGENT_DATA")]
    data_dir: PathBuf,
    /// Socket address to bind the query service
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,
}

#[derive(Args, Clone)]
struct CrmArgs {
    #[arg(long, env = "CRM_BASE_URL")]
    crm_base_url: String,
    #[arg(long, env = "CRM_USERNAME")]
    crm_username: String,
    #[arg(long, env = "CRM_PASSWORD")]
    crm_password: String,
    #[arg(long, env = "CRM_API_KEY")]
    crm_api_key: String,
    #[arg(long, env = "CRM_CLIENT_ID")]
    crm_client_id: String,
}

#[derive(Args)]
struct SyncArgs {
    #[arg(long, env = "ISPAGENT_DATA")]
    data_dir: PathBuf,
    #[command(flatten)]
    crm: CrmArgs,
    #[arg(long, env = "OLT_BASE_URL")]
    olt_base_url: String,
    #[arg(long, env = "OLT_TOKEN")]
    olt_token: String,
    #[arg(long, env = "ROUTER_USERNAME")]
    router_username: String,
    #[arg(long, env = "ROUTER_PASSWORD")]
    router_password: String,
    /// Routers polled concurrently
    #[arg(long, default_value_t = 8)]
    router_concurrency: usize,
    /// Per-router budget in seconds; expiry counts as a fetch failure
    #[arg(long, default_value_t = 15)]
    router_timeout_secs: u64,
}

#[derive(Args)]
struct ProbeArgs {
    #[arg(long, env = "ISPAGENT_DATA")]
    data_dir: PathBuf,
    /// PPPoE username to probe
    username: String,
    #[arg(long, env = "OLT_BASE_URL")]
    olt_base_url: Option<String>,
    #[arg(long, env = "OLT_TOKEN")]
    olt_token: Option<String>,
    #[arg(long, env = "ROUTER_USERNAME")]
    router_username: Option<String>,
    #[arg(long, env = "ROUTER_PASSWORD")]
    router_password: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub directory: Arc<SubscriberDirectory>,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        let directory = Arc::new(SubscriberDirectory::new(Arc::clone(&store)));
        Self { store, directory }
    }
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ispstore::StoreError> for ApiError {
    fn from(err: ispstore::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn open_store(data_dir: &std::path::Path) -> anyhow::Result<Arc<Store>> {
    let config = StoreConfig::new(data_dir);
    let store = Store::new(&config).context("failed to open local store")?;
    store
        .initialize_schema()
        .context("failed to initialize store schema")?;
    Ok(Arc::new(store))
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let addr: SocketAddr = args.bind.parse().context("failed to parse bind address")?;
    let store = open_store(&args.data_dir)?;
    let state = AppState::new(store);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind query listener")?;
    info!("Query service listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("query server error")?;

    Ok(())
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<()> {
    let store = open_store(&args.data_dir)?;

    let admin = AdminClient::new(
        &args.crm.crm_base_url,
        Credentials {
            username: args.crm.crm_username.clone(),
            password: args.crm.crm_password.clone(),
            api_key: args.crm.crm_api_key.clone(),
            client_id: args.crm.crm_client_id.clone(),
        },
    )
    .context("failed to build CRM client")?;
    let olt = OltClient::new(&args.olt_base_url, args.olt_token.clone())
        .context("failed to build OLT client")?;
    let router_timeout = Duration::from_secs(args.router_timeout_secs);
    let routers = RouterFleet::new(RouterCredentials {
        username: args.router_username.clone(),
        password: args.router_password.clone(),
    })
    .with_timeout(router_timeout);

    let orchestrator = SyncOrchestrator::new(
        store,
        Arc::new(admin),
        Arc::new(olt),
        Arc::new(routers),
        SyncOptions {
            router_concurrency: args.router_concurrency,
            router_timeout,
        },
    );

    let report = orchestrator.run().await.context("sync run failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let store = open_store(&args.data_dir)?;
    let directory = SubscriberDirectory::new(Arc::clone(&store));

    let Some(diagnosis) = directory.diagnose(&args.username)? else {
        anyhow::bail!("{} not found in any source", args.username);
    };

    let mut probe = json!({ "diagnosis": diagnosis });

    match (&args.olt_base_url, &args.olt_token) {
        (Some(base_url), Some(token)) if diagnosis.onu_external_id != NOT_AVAILABLE => {
            let olt = OltClient::new(base_url, token.clone())?;
            match olt.onu_health(&diagnosis.onu_external_id).await {
                Ok(health) => {
                    probe["onu_status"] = json!(health.status);
                    probe["onu_signal"] = json!(health.signal);
                    probe["onu_signal_value"] = json!(health.signal_value);
                }
                Err(err) => warn!("OLT health probe failed: {err}"),
            }
            match olt.onu_vlans(&diagnosis.onu_external_id).await {
                Ok(vlans) => probe["onu_vlans"] = json!(vlans),
                Err(err) => warn!("OLT VLAN probe failed: {err}"),
            }
        }
        _ => info!("skipping OLT probe (no credentials or no ONU on record)"),
    }

    match (&args.router_username, &args.router_password) {
        (Some(username), Some(password)) if diagnosis.node_ip != UNKNOWN => {
            let fleet = RouterFleet::new(RouterCredentials {
                username: username.clone(),
                password: password.clone(),
            });
            let client = fleet.client(&diagnosis.node_ip, diagnosis.node_port)?;
            match client.active_session(&args.username).await {
                Ok(Some(session)) => {
                    probe["pppoe_active"] = json!(true);
                    probe["session"] = json!({
                        "address": session.address,
                        "caller_id": session.caller_id,
                        "uptime": session.uptime,
                    });
                    let interface = format!("<pppoe-{}>", session.name);
                    match client.interface_traffic(&interface).await {
                        Ok(sample) => {
                            probe["traffic"] = json!({
                                "rx_bps": sample.rx_bits_per_second,
                                "tx_bps": sample.tx_bits_per_second,
                            });
                        }
                        Err(err) => warn!("traffic probe failed: {err}"),
                    }
                }
                Ok(None) => {
                    probe["pppoe_active"] = json!(false);
                    probe["last_logout"] = json!(diagnosis.last_logout);
                }
                Err(err) => warn!("router probe failed: {err}"),
            }
        }
        _ => info!("skipping router probe (no credentials or unresolved node)"),
    }

    println!("{}", serde_json::to_string_pretty(&probe)?);
    Ok(())
}

/// Builds the HTTP router for the query surface. Every endpoint is a pure
/// read against the local store; nothing here talks to an upstream.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/search", get(search))
        .route("/api/diagnosis/:username", get(diagnosis))
        .route("/api/sync/status", get(sync_status))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "ispagent" }))
}

#[derive(Clone, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let hits = state.directory.search(&query.q)?;
    Ok(Json(SearchResponse { hits }))
}

async fn diagnosis(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Diagnosis>> {
    let record = state
        .directory
        .diagnose(&username)?
        .ok_or_else(|| ApiError::NotFound(format!("{username} not found in any source")))?;
    Ok(Json(record))
}

async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<Vec<SyncStatus>>> {
    Ok(Json(state.store.latest_sync_status()?))
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
