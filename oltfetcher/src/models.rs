use ispstore::models::TechnicalSubscriber;
use serde::Deserialize;

/// Envelope every OLT platform endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct OnuListing {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub onus: Vec<RawOnu>,
}

/// One ONU as the bulk listing ships it. `name` carries the PPPoE username
/// the device serves.
#[derive(Debug, Deserialize)]
pub struct RawOnu {
    pub unique_external_id: Option<String>,
    pub sn: Option<String>,
    pub olt_name: Option<String>,
    pub olt_id: Option<String>,
    pub board: Option<String>,
    pub port: Option<String>,
    pub onu: Option<String>,
    pub onu_type_id: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
}

impl RawOnu {
    /// `None` when the row has no external id to key on.
    pub fn into_subscriber(self) -> Option<TechnicalSubscriber> {
        let external_id = self.unique_external_id?;
        Some(TechnicalSubscriber {
            external_id,
            serial: self.sn.unwrap_or_default(),
            olt_name: self.olt_name.unwrap_or_default(),
            olt_id: self.olt_id.unwrap_or_default(),
            board: self.board.unwrap_or_default(),
            port: self.port.unwrap_or_default(),
            onu: self.onu.unwrap_or_default(),
            onu_type: self.onu_type_id.unwrap_or_default(),
            pppoe_username: self.name.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub onu_status: Option<String>,
    #[serde(default)]
    pub onu_signal: Option<String>,
    #[serde(default)]
    pub onu_signal_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServicePortListing {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub service_ports: Vec<RawServicePort>,
}

#[derive(Debug, Deserialize)]
pub struct RawServicePort {
    pub vlan: Option<u16>,
}

/// Optical health of one device.
#[derive(Debug, Clone)]
pub struct OnuHealth {
    pub status: String,
    pub signal: String,
    pub signal_value: Option<String>,
}
