use ispstore::sync::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("API returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl From<CrmError> for SourceError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::Auth(detail) => SourceError::Auth(detail),
            CrmError::Request(inner) if inner.is_timeout() => {
                SourceError::Timeout(inner.to_string())
            }
            CrmError::Request(inner) => SourceError::Unavailable(inner.to_string()),
            CrmError::Status { status, detail } => {
                SourceError::Unavailable(format!("HTTP {status}: {detail}"))
            }
            CrmError::Malformed(detail) => SourceError::Malformed(detail),
            CrmError::Json(inner) => SourceError::Malformed(inner.to_string()),
            CrmError::BaseUrl(inner) => SourceError::Unavailable(inner.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
