use ispstore::models::RouterAccount;
use serde::Deserialize;

/// One PPP secret as the router's REST API ships it. RouterOS uses
/// kebab-case keys and strings for everything.
#[derive(Debug, Deserialize)]
pub struct RawSecret {
    pub name: Option<String>,
    pub password: Option<String>,
    pub profile: Option<String>,
    #[serde(rename = "last-caller-id")]
    pub last_caller_id: Option<String>,
    #[serde(rename = "last-logged-out")]
    pub last_logged_out: Option<String>,
    pub comment: Option<String>,
}

impl RawSecret {
    /// `None` when the entry carries no username.
    pub fn into_account(self, router_ip: &str) -> Option<RouterAccount> {
        let username = self.name?;
        Some(RouterAccount {
            username,
            router_ip: router_ip.to_string(),
            password: self.password,
            profile: self.profile,
            caller_id: self.last_caller_id,
            comment: self.comment,
            last_logout: self.last_logged_out,
        })
    }
}

/// A currently established PPP session.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSession {
    pub name: String,
    pub address: Option<String>,
    #[serde(rename = "caller-id")]
    pub caller_id: Option<String>,
    pub uptime: Option<String>,
    pub service: Option<String>,
}

/// One-shot traffic counters for a named interface.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficSample {
    #[serde(rename = "rx-bits-per-second")]
    pub rx_bits_per_second: Option<String>,
    #[serde(rename = "tx-bits-per-second")]
    pub tx_bits_per_second: Option<String>,
}
