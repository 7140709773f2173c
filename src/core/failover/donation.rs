use crate::core::failover::health::HealthProbe;
use crate::core::failover::runner::OperationRunner;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::{ClientError, SelectionPolicy};
use serde::Serialize;
use std::sync::Arc;

/// Where the popup should send donated keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationServer {
    pub server_url: String,
    pub message: String,
    /// Set when no server reported healthy and the primary was used blindly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Finds a server whose health body reports `status: healthy`
pub struct DonationLocator {
    runner: Arc<OperationRunner>,
    strict_probe: Arc<HealthProbe>,
    timeout_ms: u32,
}

impl DonationLocator {
    /// `strict_probe` should be built with `require_healthy_status = true`
    pub fn new(runner: Arc<OperationRunner>, strict_probe: Arc<HealthProbe>, timeout_ms: u32) -> Self {
        Self {
            runner,
            strict_probe,
            timeout_ms,
        }
    }

    pub async fn locate(&self) -> Result<DonationServer, ClientError> {
        let result = self
            .runner
            .run(SelectionPolicy::Sequential, None, |base_url| async move {
                let outcome = self.strict_probe.probe(&base_url, self.timeout_ms).await;
                if outcome.healthy {
                    Ok(base_url)
                } else {
                    Err(outcome.reason.unwrap_or_else(|| "unhealthy".to_string()))
                }
            })
            .await;

        match result {
            Ok(server_url) => Ok(DonationServer {
                message: format!("Using {} for donation", server_url),
                server_url,
                warning: None,
            }),
            Err(e) if e.is_pool_exhaustion() => {
                let primary = self.runner.selector().context().registry().primary().to_string();
                get_debug_logger().error_sync(
                    "DonationLocator",
                    "fallback_to_primary",
                    &format!("No healthy donation server, using {}: {}", primary, e),
                );
                Ok(DonationServer {
                    message: format!("Using {} for donation", primary),
                    server_url: primary,
                    warning: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }
}
