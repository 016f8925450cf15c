//! HTTP seam between the protocol client and the providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::{ProviderGroup, TransportError};

/// Raw result of one POST: the HTTP status and the JSON body, if any.
///
/// A non-2xx status is *not* an error at this layer: providers encode
/// business failures as HTTP errors while still returning a body.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// String field `key` of the body, if present and non-empty.
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Posts JSON to a provider group.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        group: ProviderGroup,
        path: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(
        &self,
        group: ProviderGroup,
        path: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        (**self).post(group, path, body).await
    }
}

/// Where the providers live and how long to wait for them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the company / employee provider group.
    #[serde(default = "default_employment_base_url")]
    pub employment_base_url: String,

    /// Base URL of the national registry provider group.
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Whole-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Sent as `x-api-key` on every request when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_employment_base_url() -> String {
    "http://127.0.0.1:8600".to_string()
}

fn default_registry_base_url() -> String {
    "http://127.0.0.1:8601".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            employment_base_url: default_employment_base_url(),
            registry_base_url: default_registry_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            api_key: None,
        }
    }
}

/// [`Transport`] over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    employment_base_url: String,
    registry_base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            employment_base_url: config.employment_base_url.trim_end_matches('/').to_string(),
            registry_base_url: config.registry_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, group: ProviderGroup, path: &str) -> String {
        let base = match group {
            ProviderGroup::Employment => &self.employment_base_url,
            ProviderGroup::Registry => &self.registry_base_url,
        };
        format!("{base}{path}")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        group: ProviderGroup,
        path: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(group, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Request(format!("failed to read response body: {e}"))
            }
        })?;

        // An unparseable body is reported as absent; the caller decides
        // whether that is fatal for the phase.
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };
        tracing::trace!(%url, status, has_body = body.is_some(), "provider response");
        Ok(TransportResponse { status, body })
    }
}
