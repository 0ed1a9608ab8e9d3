use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Credentials;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Upstream(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct AuthPayload {
    access_token: Option<String>,
}

/// Authenticated HTTP client for the evaluation service.
///
/// The bearer token is absent until the first `authenticate` call and is
/// replaced wholesale whenever a request observes a 401. There is no
/// proactive expiry handling and no retry policy beyond the single
/// reauthenticate-and-retry cycle in `get_json`.
pub struct UpstreamClient {
    base_url: String,
    credentials: Credentials,
    token: RwLock<Option<String>>,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            token: RwLock::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// Exchange the service-identity credentials for a bearer token.
    pub async fn authenticate(&self) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(format!("{}/auth", self.base_url))
            .json(&self.credentials)
            .send()
            .await
            .map_err(|err| ClientError::Auth(err.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClientError::Auth(format!(
                "auth endpoint returned {}",
                resp.status()
            )));
        }

        let payload: AuthPayload = resp
            .json()
            .await
            .map_err(|err| ClientError::Auth(err.to_string()))?;
        let token = payload
            .access_token
            .ok_or_else(|| ClientError::Auth("response carried no access_token".to_string()))?;

        *self.token.write().await = Some(token.clone());
        info!("Obtained upstream access token");

        Ok(token)
    }

    /// GET `{base}{path}` with the current bearer token.
    ///
    /// A 401 triggers exactly one reauthentication and one retry of the same
    /// request; a second 401, or any other failure, surfaces to the caller.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        let mut resp = self.send(&url).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.authenticate().await?;
            resp = self.send(&url).await?;
            if resp.status() == StatusCode::UNAUTHORIZED {
                return Err(ClientError::Upstream(format!(
                    "{} still unauthorized after token refresh",
                    url
                )));
            }
        }

        if !resp.status().is_success() {
            return Err(ClientError::Upstream(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }

        Ok(resp.json().await?)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        let token = self.token.read().await.clone();
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}
