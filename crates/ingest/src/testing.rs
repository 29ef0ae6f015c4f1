//! In-memory capabilities for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use cockpit_core::SourceError;

use crate::http::{HttpFetcher, HttpResponse, RequestHeaders};

/// Serves canned responses by exact URL and records every request.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    routes: HashMap<String, HttpResponse>,
    pub(crate) requests: Mutex<Vec<(String, RequestHeaders)>>,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, url: &str, status: u16, body: impl Into<bytes::Bytes>) -> Self {
        self.routes
            .insert(url.to_string(), HttpResponse::new(status, body));
        self
    }

    pub(crate) fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub(crate) fn headers_for(&self, url: &str) -> Option<RequestHeaders> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, h)| h.clone())
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(&self, url: &str, headers: &RequestHeaders) -> Result<HttpResponse, SourceError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Network(format!("connection refused: {url}")))
    }
}
