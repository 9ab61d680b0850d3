use crate::error::{CrmError, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

/// Credentials for the administrative API. The API wants the static key and
/// client id on every call in addition to the bearer token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub api_key: String,
    pub client_id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Bearer-token session owned by one client instance.
///
/// The token is acquired lazily on first use. When a call comes back with an
/// authorization failure the cached token is discarded, re-acquired exactly
/// once, and the original request is replayed; a second failure escalates.
pub struct AuthSession {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    token: Mutex<Option<String>>,
}

impl AuthSession {
    pub fn new(http: Client, base_url: &str, credentials: Credentials) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url: Url::parse(&base_url)?,
            credentials,
            token: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs one authenticated request with single-retry-on-expiry semantics.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let token = self.token(false).await?;
        let response = self.send(method.clone(), path, query, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        log::warn!("bearer token rejected, refreshing and replaying once");
        let token = self.token(true).await?;
        let response = self.send(method, path, query, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(CrmError::Auth(
                "request rejected again after token refresh".to_string(),
            ));
        }
        ensure_success(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Response> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("api-key", &self.credentials.api_key)
            .header("client-id", &self.credentials.client_id)
            .header("login-type", "api")
            .header("username", &self.credentials.username)
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        Ok(request.send().await?)
    }

    async fn token(&self, force_refresh: bool) -> Result<String> {
        let mut cached = self.token.lock().await;
        if !force_refresh {
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }
        let token = self.acquire_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// The privileged credentials→token call. Its failure is fatal for the
    /// current operation and is not retried.
    async fn acquire_token(&self) -> Result<String> {
        let url = self.base_url.join("sanctum/token")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "username": self.credentials.username,
                "password": self.credentials.password,
            }))
            .header("api-key", &self.credentials.api_key)
            .header("client-id", &self.credentials.client_id)
            .header("login-type", "api")
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CrmError::Auth(format!(
                "token endpoint answered HTTP {}",
                response.status().as_u16()
            )));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| CrmError::Auth(format!("token response unreadable: {err}")))?;
        Ok(body.token)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(CrmError::Status {
        status: status.as_u16(),
        detail,
    })
}
