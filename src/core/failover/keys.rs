//! Shared API key lookup
//!
//! Serves the key from `KeyCache` while it is fresh. On a miss the key is
//! fetched from a randomly chosen healthy server through the runner, so a
//! server that answers without a key is quarantined like any other failure.

use crate::core::failover::health::url::build_endpoint_url;
use crate::core::failover::key_cache::KeyCache;
use crate::core::failover::runner::OperationRunner;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::http_client::{HttpClientTrait, HttpRequest};
use crate::core::network::types::{ClientError, SelectionPolicy};
use std::sync::Arc;
use std::time::Duration;

/// A key handed to a caller, and whether it came from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLease {
    pub key: String,
    pub from_cache: bool,
}

pub struct KeyService {
    runner: Arc<OperationRunner>,
    client: Arc<dyn HttpClientTrait>,
    cache: KeyCache,
    key_path: String,
    timeout_ms: u32,
}

impl KeyService {
    pub fn new(
        runner: Arc<OperationRunner>,
        client: Arc<dyn HttpClientTrait>,
        cache: KeyCache,
        key_path: impl Into<String>,
        timeout_ms: u32,
    ) -> Self {
        Self {
            runner,
            client,
            cache,
            key_path: key_path.into(),
            timeout_ms,
        }
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    pub async fn get_cached_api_key(&self) -> Result<KeyLease, ClientError> {
        if let Some(key) = self.cache.get().await {
            return Ok(KeyLease {
                key,
                from_cache: true,
            });
        }
        self.refresh().await
    }

    /// Fetch a fresh key regardless of the cache and store it
    pub async fn refresh(&self) -> Result<KeyLease, ClientError> {
        let key = self
            .runner
            .run(SelectionPolicy::Random, None, |base_url| self.fetch_key(base_url))
            .await?;
        self.cache.put(&key).await?;
        get_debug_logger().key_cache_event("refreshed", Some(0));
        Ok(KeyLease {
            key,
            from_cache: false,
        })
    }

    async fn fetch_key(&self, base_url: String) -> Result<String, String> {
        let url = build_endpoint_url(&base_url, &self.key_path);
        let request = HttpRequest::get(url, self.timeout_ms)
            .with_header("Content-Type", "application/json");
        let bound = Duration::from_millis(self.timeout_ms as u64);

        let response = match tokio::time::timeout(bound, self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(message)) => return Err(message),
            Err(_) => return Err(format!("Request timeout ({}s)", self.timeout_ms / 1000)),
        };

        if !response.is_success() {
            return Err(format!("HTTP {}", response.status_code));
        }

        let body = response.json()?;
        match body.get("geminiApiKey").and_then(|v| v.as_str()) {
            Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
            _ => Err("No API key received from server".to_string()),
        }
    }
}
