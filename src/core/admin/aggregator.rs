//! Concurrent admin stats collection
//!
//! Unlike the failover scan, every candidate is asked at once: the goal is
//! coverage. Each call carries its own timeout and one failure never cancels
//! the others. API keys live in a store shared by all servers, so key counts
//! are taken from the first responder while usage counters are summed.

use crate::core::admin::stats::{normalize_stats, NormalizedStats};
use crate::core::admin::AdminError;
use crate::core::failover::health::url::{build_endpoint_url, server_identifier};
use crate::core::failover::health::{HealthDetails, HealthProbe};
use crate::core::failover::registry::ServerRegistry;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::http_client::{HttpClientTrait, HttpRequest};
use crate::core::network::types::ClientError;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One successful responder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub identifier: String,
    pub url: String,
    pub stats: NormalizedStats,
    pub response_time_ms: u64,
}

/// Aggregate over every server that answered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    // Shared key store: first responder
    pub total_api_keys: u64,
    pub active_api_keys: u64,
    pub donated_api_keys: u64,
    // Per-server usage: summed
    pub total_allocations: u64,
    pub total_api_calls: u64,
    pub total_successful_requests: u64,
    /// Percentage with one decimal; 0 when there were no calls
    pub success_rate: f64,
    /// Mean of the responders' positive average response times
    pub average_response_time: f64,
    pub online_servers: usize,
    pub servers: Vec<ServerStats>,
    /// Servers that rejected the bearer token
    pub unauthorized_servers: Vec<String>,
    pub failed_servers: Vec<String>,
    /// Source of the shared fields
    pub base_server: String,
}

/// Status board entry for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// 1-based position in the candidate list
    pub index: usize,
    pub url: String,
    pub identifier: String,
    pub online: bool,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub details: Option<HealthDetails>,
    pub error: Option<String>,
}

enum StatsReply {
    Ok(ServerStats),
    Unauthorized(String),
    Failed(String, String),
}

pub struct AdminAggregator {
    registry: ServerRegistry,
    client: Arc<dyn HttpClientTrait>,
    probe: Arc<HealthProbe>,
    stats_path: String,
    stats_timeout_ms: u32,
    status_timeout_ms: u32,
}

impl AdminAggregator {
    pub fn new(
        registry: ServerRegistry,
        client: Arc<dyn HttpClientTrait>,
        probe: Arc<HealthProbe>,
        stats_path: impl Into<String>,
        stats_timeout_ms: u32,
        status_timeout_ms: u32,
    ) -> Self {
        Self {
            registry,
            client,
            probe,
            stats_path: stats_path.into(),
            stats_timeout_ms,
            status_timeout_ms,
        }
    }

    /// Fan out the stats request to every candidate and aggregate
    pub async fn collect(&self, token: &str) -> Result<AggregatedStats, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::Unauthorized);
        }

        let start = Instant::now();
        let calls = self
            .registry
            .list_candidates()
            .iter()
            .map(|base_url| self.fetch_stats(base_url, token));
        let replies = join_all(calls).await;

        let mut responders = Vec::new();
        let mut unauthorized = Vec::new();
        let mut failed = Vec::new();
        for reply in replies {
            match reply {
                StatsReply::Ok(stats) => responders.push(stats),
                StatsReply::Unauthorized(url) => unauthorized.push(url),
                StatsReply::Failed(url, reason) => {
                    get_debug_logger().debug_sync(
                        "AdminAggregator",
                        "stats_failed",
                        &format!("{}: {}", url, reason),
                    );
                    failed.push(url);
                }
            }
        }

        let logger = get_debug_logger();
        logger.aggregation_summary(responders.len(), unauthorized.len(), failed.len());
        logger.performance_sync("AdminAggregator", "collect", start.elapsed().as_millis() as u64);

        if responders.is_empty() {
            return Err(AdminError::NoServersReachable {
                tried: self.registry.len(),
                unauthorized,
            }
            .into());
        }

        Ok(aggregate(responders, unauthorized, failed))
    }

    async fn fetch_stats(&self, base_url: &str, token: &str) -> StatsReply {
        let url = build_endpoint_url(base_url, &self.stats_path);
        let request = HttpRequest::get(url, self.stats_timeout_ms)
            .with_bearer(token)
            .with_header("Accept", "application/json");
        let bound = Duration::from_millis(self.stats_timeout_ms as u64);
        let start = Instant::now();

        let response = match tokio::time::timeout(bound, self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(message)) => return StatsReply::Failed(base_url.to_string(), message),
            Err(_) => return StatsReply::Failed(base_url.to_string(), "timeout".to_string()),
        };

        if response.status_code == 401 {
            get_debug_logger().error_sync(
                "AdminAggregator",
                "unauthorized",
                &format!("Authentication failed for {}", base_url),
            );
            return StatsReply::Unauthorized(base_url.to_string());
        }
        if !response.is_success() {
            return StatsReply::Failed(base_url.to_string(), format!("HTTP {}", response.status_code));
        }

        match response.json() {
            Ok(raw) if raw.is_object() => StatsReply::Ok(ServerStats {
                identifier: server_identifier(base_url),
                url: base_url.to_string(),
                stats: normalize_stats(&raw),
                response_time_ms: start.elapsed().as_millis() as u64,
            }),
            Ok(_) => StatsReply::Failed(base_url.to_string(), "stats body is not an object".to_string()),
            Err(e) => StatsReply::Failed(base_url.to_string(), e),
        }
    }

    /// Probe every candidate concurrently for the status board
    pub async fn check_all_servers(&self) -> Vec<ServerStatus> {
        let checks = self
            .registry
            .list_candidates()
            .iter()
            .enumerate()
            .map(|(i, base_url)| async move {
                let outcome = self.probe.probe(base_url, self.status_timeout_ms).await;
                ServerStatus {
                    index: i + 1,
                    url: base_url.clone(),
                    identifier: server_identifier(base_url),
                    online: outcome.healthy,
                    status_code: outcome.status_code,
                    response_time_ms: outcome.response_time_ms,
                    details: if outcome.healthy { outcome.details } else { None },
                    error: if outcome.healthy { None } else { outcome.reason },
                }
            });
        join_all(checks).await
    }

    pub async fn online_server_count(&self) -> usize {
        self.check_all_servers()
            .await
            .iter()
            .filter(|status| status.online)
            .count()
    }
}

/// Fold responders (in candidate order) into one view
fn aggregate(responders: Vec<ServerStats>, unauthorized: Vec<String>, failed: Vec<String>) -> AggregatedStats {
    let base = &responders[0];
    let mut result = AggregatedStats {
        total_api_keys: base.stats.total_api_keys,
        active_api_keys: base.stats.active_api_keys,
        donated_api_keys: base.stats.donated_api_keys,
        total_allocations: 0,
        total_api_calls: 0,
        total_successful_requests: 0,
        success_rate: 0.0,
        average_response_time: 0.0,
        online_servers: responders.len(),
        servers: Vec::new(),
        unauthorized_servers: unauthorized,
        failed_servers: failed,
        base_server: base.identifier.clone(),
    };

    for server in &responders {
        result.total_allocations += server.stats.total_allocations;
        result.total_api_calls += server.stats.total_api_calls;
        result.total_successful_requests += server.stats.total_successful_requests;
    }

    if result.total_api_calls > 0 {
        let rate = result.total_successful_requests as f64 / result.total_api_calls as f64 * 100.0;
        result.success_rate = (rate * 10.0).round() / 10.0;
    }

    let times: Vec<f64> = responders
        .iter()
        .map(|s| s.stats.average_response_time)
        .filter(|t| *t > 0.0)
        .collect();
    if !times.is_empty() {
        result.average_response_time = times.iter().sum::<f64>() / times.len() as f64;
    }

    result.servers = responders;
    result
}
