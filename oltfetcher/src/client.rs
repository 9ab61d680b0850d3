use crate::error::{OltError, Result};
use crate::models::{OnuHealth, OnuListing, ServicePortListing, StatusEnvelope};
use async_trait::async_trait;
use ispstore::models::TechnicalSubscriber;
use ispstore::sync::{OltSource, SourceResult};
use reqwest::{Client, Response};
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the OLT provisioning platform. Authentication is a static
/// token sent as a header on every call; there is no session to refresh.
pub struct OltClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl OltClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        // A trailing slash keeps Url::join from eating the last path segment.
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url: Url::parse(&base_url)?,
            token: token.into(),
        })
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let response = self
            .http
            .get(url)
            .header("X-Token", &self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(OltError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }

    /// The full ONU batch. The upstream has no incremental feed, so this is
    /// the whole fleet every time.
    pub async fn all_onus(&self) -> Result<Vec<TechnicalSubscriber>> {
        let response = self.get("onu/get_all_onus_details").await?;
        let listing: OnuListing = response.json().await?;
        if !listing.status {
            return Err(OltError::Malformed(
                "ONU listing answered with status=false".to_string(),
            ));
        }
        let subscribers: Vec<TechnicalSubscriber> = listing
            .onus
            .into_iter()
            .filter_map(|raw| raw.into_subscriber())
            .collect();
        log::info!("OLT listing: {} ONUs", subscribers.len());
        Ok(subscribers)
    }

    /// Live status and optical signal level of one device.
    pub async fn onu_health(&self, external_id: &str) -> Result<OnuHealth> {
        let status: StatusEnvelope = self
            .get(&format!("onu/get_onu_status/{external_id}"))
            .await?
            .json()
            .await?;
        let signal: StatusEnvelope = self
            .get(&format!("onu/get_onu_signal/{external_id}"))
            .await?
            .json()
            .await?;
        Ok(OnuHealth {
            status: status.onu_status.unwrap_or_else(|| "unknown".to_string()),
            signal: signal.onu_signal.unwrap_or_else(|| "unknown".to_string()),
            signal_value: signal.onu_signal_value,
        })
    }

    /// VLANs attached to one device, derived from its service-port list.
    pub async fn onu_vlans(&self, external_id: &str) -> Result<Vec<u16>> {
        let listing: ServicePortListing = self
            .get(&format!("onu/get_onu_service_ports/{external_id}"))
            .await?
            .json()
            .await?;
        if !listing.status {
            return Err(OltError::Malformed(
                "service-port listing answered with status=false".to_string(),
            ));
        }
        let vlans: BTreeSet<u16> = listing
            .service_ports
            .into_iter()
            .filter_map(|port| port.vlan)
            .collect();
        Ok(vlans.into_iter().collect())
    }
}

#[async_trait]
impl OltSource for OltClient {
    async fn subscribers(&self) -> SourceResult<Vec<TechnicalSubscriber>> {
        Ok(self.all_onus().await?)
    }
}
