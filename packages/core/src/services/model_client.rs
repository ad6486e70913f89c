//! Model Fetch Adapters
//!
//! [`ModelClient`] is the seam between the model manager and wherever model
//! documents come from. It receives a request path that already carries the
//! selector and extension (`/content/site/page.model.json`) and returns the
//! parsed JSON tree.
//!
//! - [`HttpModelClient`] - reqwest-backed, optional API host prefix
//! - [`InMemoryModelClient`] - fixed documents with fetch counting and optional
//!   simulated latency, for offline use and tests
//!
//! Adapters never retry; the caller decides what to do with a failure.

use crate::services::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Source of model documents
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Fetch and parse the model at `model_path`
    async fn fetch(&self, model_path: &str) -> Result<Value, FetchError>;
}

/// Fetches model documents over HTTP
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http: reqwest::Client,
    api_host: String,
}

impl HttpModelClient {
    /// Create a client; `api_host` (e.g. `http://localhost:4502`) prefixes every request
    pub fn new(api_host: Option<&str>) -> Self {
        Self::with_client(reqwest::Client::new(), api_host)
    }

    /// Create a client around a preconfigured reqwest client
    pub fn with_client(http: reqwest::Client, api_host: Option<&str>) -> Self {
        Self {
            http,
            api_host: api_host.unwrap_or_default().trim_end_matches('/').to_string(),
        }
    }

    /// API host prefix, empty when requests are relative
    pub fn api_host(&self) -> &str {
        &self.api_host
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn fetch(&self, model_path: &str) -> Result<Value, FetchError> {
        if model_path.is_empty() {
            return Err(FetchError::InvalidUrl(
                "fetching model rejected for an empty path".to_string(),
            ));
        }

        let url = format!("{}{}", self.api_host, model_path);
        tracing::debug!("Fetching model from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::network(&url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!("Model request to {} failed: {}", url, status);
            return Err(FetchError::status(status.as_u16(), url));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::invalid_response(&url, e))
    }
}

/// Serves model documents from memory
///
/// Unknown paths fail with status 404, like a server would.
#[derive(Debug, Default)]
pub struct InMemoryModelClient {
    models: RwLock<HashMap<String, Value>>,
    failures: RwLock<HashMap<String, u16>>,
    fetch_count: AtomicUsize,
    delay: Option<Duration>,
}

impl InMemoryModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `delay`, so concurrent callers overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `model` for requests to `model_path`
    pub fn with_model(self, model_path: impl Into<String>, model: Value) -> Self {
        self.insert(model_path, model);
        self
    }

    /// Add or replace the document served for `model_path`
    pub fn insert(&self, model_path: impl Into<String>, model: Value) {
        self.models
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(model_path.into(), model);
    }

    /// Answer requests to `model_path` with `status`
    pub fn fail_with(&self, model_path: impl Into<String>, status: u16) {
        self.failures
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(model_path.into(), status);
    }

    /// Number of fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for InMemoryModelClient {
    async fn fetch(&self, model_path: &str) -> Result<Value, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(model_path)
            .copied();
        if let Some(status) = failure {
            return Err(FetchError::status(status, model_path));
        }

        self.models
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(model_path)
            .cloned()
            .ok_or_else(|| FetchError::status(404, model_path))
    }
}
