//! Server selection state machine
//!
//! ```text
//! UseSticky ──ok──▶ Resolved
//!     │ fail / none
//!     ▼
//! ScanPool ──ok──▶ Resolved
//!     │ candidate failed → quarantine, loop
//!     │ pool empty, probed this pass ──▶ Exhausted
//!     │ pool empty, nothing probed  ──▶ AllQuarantined
//!     ▼
//! AllQuarantined ──first──▶ reset quarantine, ScanPool
//!                ──second─▶ Exhausted
//! ```
//!
//! Every returned base URL passed a probe inside the same `resolve` call.

use crate::core::failover::context::FailoverContext;
use crate::core::failover::health::HealthProbe;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::{ClientError, SelectionPolicy};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    UseSticky,
    ScanPool,
    AllQuarantined,
    Resolved(String),
    Exhausted,
}

pub struct FailoverSelector {
    context: Arc<FailoverContext>,
    probe: Arc<HealthProbe>,
    sticky_timeout_ms: u32,
    scan_timeout_ms: u32,
}

impl FailoverSelector {
    pub fn new(
        context: Arc<FailoverContext>,
        probe: Arc<HealthProbe>,
        sticky_timeout_ms: u32,
        scan_timeout_ms: u32,
    ) -> Self {
        Self {
            context,
            probe,
            sticky_timeout_ms,
            scan_timeout_ms,
        }
    }

    pub fn context(&self) -> &Arc<FailoverContext> {
        &self.context
    }

    pub fn probe(&self) -> &Arc<HealthProbe> {
        &self.probe
    }

    /// Resolve a working base URL
    pub async fn resolve(&self, policy: SelectionPolicy) -> Result<String, ClientError> {
        self.resolve_traced(policy).await.0
    }

    /// Resolve and also return every state visited, in order
    pub async fn resolve_traced(
        &self,
        policy: SelectionPolicy,
    ) -> (Result<String, ClientError>, Vec<SelectorState>) {
        let logger = get_debug_logger();
        let mut trace = Vec::new();
        let mut state = SelectorState::UseSticky;
        let mut reset_used = false;
        let mut probed_this_pass = 0usize;
        let mut tried: HashSet<String> = HashSet::new();

        loop {
            trace.push(state.clone());
            state = match state {
                SelectorState::UseSticky => self.check_sticky(&mut tried).await,

                SelectorState::ScanPool => {
                    let pool = self.context.available_servers();
                    if pool.is_empty() {
                        if probed_this_pass > 0 {
                            SelectorState::Exhausted
                        } else {
                            SelectorState::AllQuarantined
                        }
                    } else {
                        let candidate = pick(&pool, policy);
                        probed_this_pass += 1;
                        tried.insert(candidate.clone());
                        let outcome = self.probe.probe(&candidate, self.scan_timeout_ms).await;
                        if outcome.healthy {
                            self.context.set_sticky(&candidate).await;
                            SelectorState::Resolved(candidate)
                        } else {
                            logger.debug_sync(
                                "FailoverSelector",
                                "candidate_failed",
                                &format!(
                                    "{} failed probe: {}",
                                    candidate,
                                    outcome.reason.as_deref().unwrap_or("unknown")
                                ),
                            );
                            self.context.quarantine(&candidate);
                            SelectorState::ScanPool
                        }
                    }
                }

                SelectorState::AllQuarantined => {
                    if reset_used {
                        SelectorState::Exhausted
                    } else {
                        reset_used = true;
                        probed_this_pass = 0;
                        self.context.reset_quarantine("pool_exhausted");
                        SelectorState::ScanPool
                    }
                }

                SelectorState::Resolved(base_url) => return (Ok(base_url), trace),

                SelectorState::Exhausted => {
                    logger.error_sync(
                        "FailoverSelector",
                        "pool_exhausted",
                        &format!("No server reachable, {} candidate(s) tried", tried.len()),
                    );
                    return (
                        Err(ClientError::NoServerReachable { tried: tried.len() }),
                        trace,
                    );
                }
            };
        }
    }

    async fn check_sticky(&self, tried: &mut HashSet<String>) -> SelectorState {
        let sticky = match self.context.sticky() {
            Some(sticky) => sticky,
            None => return SelectorState::ScanPool,
        };

        if self.context.is_quarantined(&sticky) {
            self.context.clear_sticky().await;
            return SelectorState::ScanPool;
        }

        tried.insert(sticky.clone());
        let outcome = self.probe.probe(&sticky, self.sticky_timeout_ms).await;
        if outcome.healthy {
            SelectorState::Resolved(sticky)
        } else {
            // Short-timeout miss only drops the sticky; the scan decides quarantine
            self.context.clear_sticky().await;
            SelectorState::ScanPool
        }
    }
}

fn pick(pool: &[String], policy: SelectionPolicy) -> String {
    match policy {
        SelectionPolicy::Sequential => pool[0].clone(),
        SelectionPolicy::Random => {
            let index = rand::thread_rng().gen_range(0..pool.len());
            pool[index].clone()
        }
    }
}
