//! Network fetch capability used by every HTTP-backed connector.
//!
//! Connectors only see the [`HttpFetcher`] trait so tests can swap in an
//! in-memory implementation. [`ReqwestFetcher`] is the production client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use cockpit_core::config::HttpConfig;
use cockpit_core::SourceError;

/// Ordered request headers. Inserting an existing name replaces its value
/// and keeps the original position.
pub type RequestHeaders = IndexMap<String, String>;

/// Raw response from a GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`SourceError::Http`].
    pub fn error_for_status(self, url: &str) -> Result<Self, SourceError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SourceError::Http {
                status: self.status,
                url: url.to_string(),
            })
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value, SourceError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| SourceError::Parse(format!("JSON invalide: {e}")))
    }
}

/// Single-shot GET capability. No retries, no backoff.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, headers: &RequestHeaders) -> Result<HttpResponse, SourceError>;
}

/// [`HttpFetcher`] backed by a shared `reqwest` client (connection pooling).
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(config.user_agent.clone())
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, headers: &RequestHeaders) -> Result<HttpResponse, SourceError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("lecture de la réponse: {e}")))?;

        debug!(url, status, bytes = body.len(), "http get completed");
        Ok(HttpResponse { status, body })
    }
}
