use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use legacy_import_core::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub device_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

/// HTTP client for the inventory API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("legacy-import-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST mobile/acquire-token`
    pub async fn acquire_token(&self, request: &TokenRequest<'_>) -> Result<TokenResponse> {
        debug!("Requesting token for {}", request.email);
        let builder = self
            .http
            .post(self.url("mobile/acquire-token"))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request);

        let body = self.send(builder).await?;
        serde_json::from_value(body).context("Unexpected token response")
    }

    /// `GET language`
    pub async fn language_index(&self) -> Result<Value> {
        let mut builder = self
            .http
            .get(self.url("language"))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        self.send(builder).await
    }

    /// Send, enforce the timeout, and turn non-2xx answers into [`ApiError`]
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = match timeout(self.timeout, builder.send()).await {
            Ok(response) => response.context("Request failed")?,
            Err(_) => {
                return Err(anyhow!(
                    "Request timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            }
        };

        let status = response.status();
        let body = response.text().await.context("Failed to read response body")?;

        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("Request failed");
            return Err(ApiError::new(status.as_u16(), message, body).into());
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).context("Response is not valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:8000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.url("/mobile/acquire-token"),
            "http://localhost:8000/api/mobile/acquire-token"
        );
    }

    #[test]
    fn test_token_request_body() {
        let body = serde_json::to_value(TokenRequest {
            email: "user@example.com",
            password: "secret",
            device_name: "legacy-import-cli",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "email": "user@example.com",
                "password": "secret",
                "device_name": "legacy-import-cli"
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let client = ApiClient::new("http://127.0.0.1:9")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert!(client.language_index().await.is_err());
    }
}
