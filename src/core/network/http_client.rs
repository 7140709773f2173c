//! HTTP Client Abstraction
//!
//! One request/response shape for every outgoing call the client makes:
//! health probes, key fetches, admin stats and the vision API. The trait
//! exists for dependency injection; tests swap in URL-keyed mocks.

use crate::core::network::types::ClientError;
use std::collections::HashMap;
use std::time::Duration;

#[cfg(feature = "http-client")]
use isahc::config::{Configurable, RedirectPolicy};
#[cfg(feature = "http-client")]
use isahc::{AsyncReadResponseExt, HttpClient, Request};
#[cfg(feature = "http-client")]
use std::time::Instant;

pub const USER_AGENT: &str = concat!("kimaaka/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Outgoing request with its own time bound
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Per-request timeout; the only cancellation primitive available
    pub timeout_ms: u32,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout_ms: u32) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers,
            body: Vec::new(),
            timeout_ms,
        }
    }

    pub fn post_json(
        url: impl Into<String>,
        payload: &serde_json::Value,
        timeout_ms: u32,
    ) -> Result<Self, ClientError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ClientError::Http(format!("Payload serialization failed: {}", e)))?;
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        Ok(Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers,
            body,
            timeout_ms,
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }
}

/// Complete response data; headers are lower-cased
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub duration: Duration,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parse the body as JSON; empty bodies become `Value::Null`
    pub fn json(&self) -> Result<serde_json::Value, String> {
        if self.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| format!("Invalid JSON body: {}", e))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client abstraction for dependency injection and testing
#[async_trait::async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Execute the request, bounded by `request.timeout_ms`
    ///
    /// # Returns
    /// * `Ok(HttpResponse)` - Any HTTP status, including non-2xx
    /// * `Err(String)` - Network error, timeout, or request construction failure
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Production HTTP client implementation using isahc
#[cfg(feature = "http-client")]
pub struct IsahcHttpClient {
    client: HttpClient,
}

#[cfg(feature = "http-client")]
#[async_trait::async_trait]
impl HttpClientTrait for IsahcHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let start = Instant::now();

        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(&request.url)
            .timeout(Duration::from_millis(request.timeout_ms as u64))
            .header("User-Agent", USER_AGENT);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let http_request = builder
            .body(request.body)
            .map_err(|e| format!("Request creation failed: {}", e))?;

        let mut response = self
            .client
            .send_async(http_request)
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status_code = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string().to_lowercase(), value_str.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?
            .to_vec();

        Ok(HttpResponse {
            status_code,
            body,
            duration: start.elapsed(),
            headers,
        })
    }
}

#[cfg(feature = "http-client")]
impl IsahcHttpClient {
    pub fn new() -> Result<Self, ClientError> {
        let client = HttpClient::builder()
            .redirect_policy(RedirectPolicy::Limit(3))
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

/// Transport used when the `http-client` feature is disabled
///
/// Every request fails as a transport error, which the failover core treats
/// like an unreachable server.
#[derive(Default)]
pub struct OfflineHttpClient;

#[async_trait::async_trait]
impl HttpClientTrait for OfflineHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        Err(format!(
            "HTTP support disabled at build time ({} {})",
            request.method.as_str(),
            request.url
        ))
    }
}

/// Build the default transport for this build configuration
pub fn default_http_client() -> Result<std::sync::Arc<dyn HttpClientTrait>, ClientError> {
    #[cfg(feature = "http-client")]
    let client: std::sync::Arc<dyn HttpClientTrait> = std::sync::Arc::new(IsahcHttpClient::new()?);
    #[cfg(not(feature = "http-client"))]
    let client: std::sync::Arc<dyn HttpClientTrait> = std::sync::Arc::new(OfflineHttpClient);
    Ok(client)
}
