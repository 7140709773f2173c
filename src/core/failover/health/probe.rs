//! Bounded-timeout liveness check against a candidate's health endpoint
//!
//! A probe is healthy only when the endpoint answers with a 2xx status within
//! the timeout. Network errors, non-2xx statuses and timeouts are unhealthy.
//! Probing never touches the quarantine set; callers own that decision.

use crate::core::failover::health::parsing::{parse_health_body, HealthDetails};
use crate::core::failover::health::url::build_endpoint_url;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::http_client::{HttpClientTrait, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Probe configuration
#[derive(Debug, Clone)]
pub struct HealthProbeOptions {
    /// Primary health path, e.g. `/api/health`
    pub health_path: String,
    /// Tried once when the primary path answers 404
    pub fallback_path: Option<String>,
    /// Additionally require `{"status": "healthy"}` in the body
    pub require_healthy_status: bool,
}

impl Default for HealthProbeOptions {
    fn default() -> Self {
        Self {
            health_path: "/api/health".to_string(),
            fallback_path: Some("/health".to_string()),
            require_healthy_status: false,
        }
    }
}

/// Result of one probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub base_url: String,
    pub healthy: bool,
    /// URL that produced the final answer
    pub checked_url: String,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    /// Why the probe was unhealthy: "timeout", "network_error", "http_<code>",
    /// "status_not_healthy"
    pub reason: Option<String>,
    pub details: Option<HealthDetails>,
}

enum Attempt {
    Answered(HttpResponse),
    TimedOut,
    Failed(String),
}

pub struct HealthProbe {
    client: Arc<dyn HttpClientTrait>,
    options: HealthProbeOptions,
}

impl HealthProbe {
    pub fn new(client: Arc<dyn HttpClientTrait>, options: HealthProbeOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &HealthProbeOptions {
        &self.options
    }

    /// Probe `base_url` with the given timeout
    pub async fn probe(&self, base_url: &str, timeout_ms: u32) -> ProbeOutcome {
        let logger = get_debug_logger();
        let probe_id = format!("probe_{}", uuid::Uuid::new_v4());
        logger.server_probe_start(base_url, timeout_ms, probe_id.clone());

        let start = Instant::now();
        let primary_url = build_endpoint_url(base_url, &self.options.health_path);
        let mut checked_url = primary_url.clone();
        let mut attempt = self.attempt(primary_url, timeout_ms).await;

        let answered_404 = matches!(&attempt, Attempt::Answered(r) if r.status_code == 404);
        if let (true, Some(fallback)) = (answered_404, &self.options.fallback_path) {
            // The fallback shares the original time budget
            let elapsed = start.elapsed().as_millis() as u32;
            let remaining = timeout_ms.saturating_sub(elapsed);
            checked_url = build_endpoint_url(base_url, fallback);
            attempt = if remaining == 0 {
                Attempt::TimedOut
            } else {
                self.attempt(checked_url.clone(), remaining).await
            };
        }

        let outcome = self.classify(base_url, checked_url, attempt, start);
        logger.server_probe_end(
            base_url,
            outcome.healthy,
            outcome.status_code,
            outcome.response_time_ms,
            probe_id,
        );
        outcome
    }

    async fn attempt(&self, url: String, timeout_ms: u32) -> Attempt {
        let request = HttpRequest::get(url, timeout_ms);
        let bound = Duration::from_millis(timeout_ms as u64);
        match tokio::time::timeout(bound, self.client.execute(request)).await {
            Ok(Ok(response)) => Attempt::Answered(response),
            Ok(Err(message)) if is_timeout_message(&message) => Attempt::TimedOut,
            Ok(Err(message)) => Attempt::Failed(message),
            Err(_) => Attempt::TimedOut,
        }
    }

    fn classify(&self, base_url: &str, checked_url: String, attempt: Attempt, start: Instant) -> ProbeOutcome {
        let mut outcome = ProbeOutcome {
            base_url: base_url.to_string(),
            healthy: false,
            checked_url,
            status_code: None,
            response_time_ms: start.elapsed().as_millis() as u64,
            reason: None,
            details: None,
        };

        match attempt {
            Attempt::TimedOut => outcome.reason = Some("timeout".to_string()),
            Attempt::Failed(message) => outcome.reason = Some(format!("network_error: {}", message)),
            Attempt::Answered(response) => {
                outcome.status_code = Some(response.status_code);
                outcome.details = parse_health_body(&response.body);
                if !response.is_success() {
                    outcome.reason = Some(format!("http_{}", response.status_code));
                } else if self.options.require_healthy_status
                    && !outcome.details.as_ref().map(HealthDetails::reports_healthy).unwrap_or(false)
                {
                    outcome.reason = Some("status_not_healthy".to_string());
                } else {
                    outcome.healthy = true;
                }
            }
        }
        outcome
    }
}

fn is_timeout_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timed out") || lower.contains("timeout")
}
