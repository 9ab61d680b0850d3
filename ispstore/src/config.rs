use serde::Deserialize;
use std::path::PathBuf;

/// Port routers answer on when a node row carries no explicit `api_port`.
pub const DEFAULT_ROUTER_API_PORT: u16 = 8728;

#[derive(Deserialize, Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub default_router_port: u16,
}

impl StoreConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            db_path: base_path.join("subscribers.sqlite"),
            default_router_port: DEFAULT_ROUTER_API_PORT,
        }
    }

    pub fn with_router_port(mut self, port: u16) -> Self {
        self.default_router_port = port;
        self
    }
}
