use ispstore::sync::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OltError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl From<OltError> for SourceError {
    fn from(err: OltError) -> Self {
        match err {
            OltError::Request(inner) if inner.is_timeout() => SourceError::Timeout(inner.to_string()),
            OltError::Request(inner) => SourceError::Unavailable(inner.to_string()),
            OltError::Status { status: 401 | 403, detail } => SourceError::Auth(detail),
            OltError::Status { status, detail } => {
                SourceError::Unavailable(format!("HTTP {status}: {detail}"))
            }
            OltError::Malformed(detail) => SourceError::Malformed(detail),
            OltError::Json(inner) => SourceError::Malformed(inner.to_string()),
            OltError::BaseUrl(inner) => SourceError::Unavailable(inner.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OltError>;
