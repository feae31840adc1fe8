//! Minimal fetch wrapper over the SMARTIO backend.
//!
//! Both page controllers talk to the backend through the `Transport` trait so
//! their decision logic can run against a scripted fake. `HttpClient` is the
//! real implementation on top of `reqwest`.

use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;

use super::ApiError;

/// Status line and raw body of a completed request.
///
/// Non-2xx responses are replies too; only transport failures are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// The two request shapes the session lifecycle needs.
pub trait Transport {
    /// POST `fields` as `application/x-www-form-urlencoded` to `path`.
    fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpReply, ApiError>>;

    /// GET `path` with an `Authorization: Bearer <token>` header.
    fn get_with_bearer(
        &self,
        path: &str,
        token: &str,
    ) -> impl Future<Output = Result<HttpReply, ApiError>>;
}

/// HTTP client for the SMARTIO backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for the backend named in `config`
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn classify(e: reqwest::Error) -> ApiError {
        if e.is_connect() {
            ApiError::ConnectionFailed(e.to_string())
        } else {
            ApiError::NetworkError(e)
        }
    }

    async fn into_reply(response: reqwest::Response) -> Result<HttpReply, ApiError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(Self::classify)?;
        debug!(status, bytes = body.len(), "Response received");
        Ok(HttpReply { status, body })
    }
}

impl Transport for HttpClient {
    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<HttpReply, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST form");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .form(fields)
            .send()
            .await
            .map_err(Self::classify)?;

        Self::into_reply(response).await
    }

    async fn get_with_bearer(&self, path: &str, token: &str) -> Result<HttpReply, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET with bearer token");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::classify)?;

        Self::into_reply(response).await
    }
}
