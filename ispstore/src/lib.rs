pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod store;
pub mod sync;

pub use config::StoreConfig;
pub use engine::SubscriberDirectory;
pub use errors::{Result, StoreError};
pub use store::Store;
pub use sync::{SyncOptions, SyncOrchestrator};
