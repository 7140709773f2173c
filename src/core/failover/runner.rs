//! Retry loop around a server-scoped operation
//!
//! The runner asks the selector for a server, runs the operation against it,
//! and on failure quarantines that server and tries again until the attempt
//! budget runs out. Success makes the server sticky and records it as the
//! last used server.

use crate::core::failover::selector::FailoverSelector;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::{ClientError, SelectionPolicy};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct OperationRunner {
    selector: Arc<FailoverSelector>,
    last_server_retry_delay: Duration,
}

impl OperationRunner {
    pub fn new(selector: Arc<FailoverSelector>, last_server_retry_delay_ms: u64) -> Self {
        Self {
            selector,
            last_server_retry_delay: Duration::from_millis(last_server_retry_delay_ms),
        }
    }

    pub fn selector(&self) -> &Arc<FailoverSelector> {
        &self.selector
    }

    /// Run `operation` against selected servers
    ///
    /// `max_attempts` defaults to the number of configured candidates.
    pub async fn run<T, E, F, Fut>(
        &self,
        policy: SelectionPolicy,
        max_attempts: Option<usize>,
        operation: F,
    ) -> Result<T, ClientError>
    where
        E: Display,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let logger = get_debug_logger();
        let context = self.selector.context().clone();
        let max_attempts = max_attempts.unwrap_or_else(|| context.registry().len()).max(1);
        let mut attempts = 0usize;
        let mut last_error = String::from("no attempt made");

        while attempts < max_attempts {
            let base_url = match self.selector.resolve(policy).await {
                Ok(base_url) => base_url,
                Err(e) if attempts == 0 => return Err(e),
                Err(e) => {
                    last_error = e.to_string();
                    break;
                }
            };

            attempts += 1;
            match operation(base_url.clone()).await {
                Ok(value) => {
                    logger.operation_attempt(attempts, max_attempts, &base_url, "success");
                    context.record_success(&base_url).await;
                    return Ok(value);
                }
                Err(e) => {
                    last_error = e.to_string();
                    logger.operation_attempt(attempts, max_attempts, &base_url, &last_error);
                    context.quarantine(&base_url);
                    context.clear_sticky_if(&base_url).await;

                    if attempts < max_attempts && context.available_servers().is_empty() {
                        tokio::time::sleep(self.last_server_retry_delay).await;
                    }
                }
            }
        }

        Err(ClientError::AllServersFailed {
            attempts,
            last_error,
        })
    }
}
