use crate::error::{Result, RouterError};
use crate::models::{ActiveSession, RawSecret, TrafficSample};
use async_trait::async_trait;
use ispstore::models::RouterAccount;
use ispstore::sync::{RouterSource, SourceResult};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared credentials for a fleet of routers speaking the same REST API.
#[derive(Debug, Clone)]
pub struct RouterCredentials {
    pub username: String,
    pub password: String,
}

/// REST client for one router, addressed by management IP and API port.
pub struct RouterClient {
    http: Client,
    base_url: String,
    host: String,
    credentials: RouterCredentials,
}

impl RouterClient {
    pub fn new(host: &str, port: u16, credentials: RouterCredentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: format!("http://{host}:{port}/rest"),
            host: host.to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.base_url))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(RouterError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    /// The router's whole PPP AAA table.
    pub async fn ppp_secrets(&self) -> Result<Vec<RouterAccount>> {
        let response = self.request(Method::GET, "ppp/secret").send().await?;
        let response = Self::ensure_success(response).await?;
        let secrets: Vec<RawSecret> = response.json().await?;
        let accounts: Vec<RouterAccount> = secrets
            .into_iter()
            .filter_map(|raw| raw.into_account(&self.host))
            .collect();
        log::debug!("router {}: {} PPP secrets", self.host, accounts.len());
        Ok(accounts)
    }

    /// PPP sessions established right now.
    pub async fn active_sessions(&self) -> Result<Vec<ActiveSession>> {
        let response = self.request(Method::GET, "ppp/active").send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Is this username online on this router right now?
    pub async fn active_session(&self, username: &str) -> Result<Option<ActiveSession>> {
        let sessions = self.active_sessions().await?;
        Ok(sessions
            .into_iter()
            .find(|session| session.name.eq_ignore_ascii_case(username)))
    }

    /// One-shot traffic snapshot for a named interface.
    pub async fn interface_traffic(&self, interface: &str) -> Result<TrafficSample> {
        let response = self
            .request(Method::POST, "interface/monitor-traffic")
            .json(&serde_json::json!({ "interface": interface, "once": true }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let mut samples: Vec<TrafficSample> = response.json().await?;
        samples
            .pop()
            .ok_or_else(|| RouterError::Malformed(format!("no traffic sample for {interface}")))
    }
}

/// Fleet-wide `RouterSource`: one set of credentials, per-call host and port.
pub struct RouterFleet {
    credentials: RouterCredentials,
    timeout: Duration,
}

impl RouterFleet {
    pub fn new(credentials: RouterCredentials) -> Self {
        Self {
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self, host: &str, port: u16) -> Result<RouterClient> {
        RouterClient::new(host, port, self.credentials.clone(), self.timeout)
    }
}

#[async_trait]
impl RouterSource for RouterFleet {
    async fn accounts(&self, host: &str, port: u16) -> SourceResult<Vec<RouterAccount>> {
        let client = self.client(host, port)?;
        Ok(client.ppp_secrets().await?)
    }
}
