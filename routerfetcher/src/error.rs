use ispstore::sync::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("router answered HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RouterError> for SourceError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Request(inner) if inner.is_timeout() => {
                SourceError::Timeout(inner.to_string())
            }
            RouterError::Request(inner) => SourceError::Unavailable(inner.to_string()),
            RouterError::Status { status: 401 | 403, detail } => SourceError::Auth(detail),
            RouterError::Status { status, detail } => {
                SourceError::Unavailable(format!("HTTP {status}: {detail}"))
            }
            RouterError::Malformed(detail) => SourceError::Malformed(detail),
            RouterError::Json(inner) => SourceError::Malformed(inner.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
