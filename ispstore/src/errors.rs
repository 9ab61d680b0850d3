use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite operation failed: {0}")]
    SQLite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Synchronization failed: {0}")]
    Sync(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
