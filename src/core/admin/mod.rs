//! Admin console support
//!
//! - `AdminSession`: persisted bearer token and user record
//! - `AdminAggregator`: concurrent stats fan-out and the server status board
//! - `stats`: defensive normalization of per-server stats payloads

pub mod aggregator;
pub mod session;
pub mod stats;

pub use aggregator::{AdminAggregator, AggregatedStats, ServerStats, ServerStatus};
pub use session::AdminSession;
pub use stats::{normalize_stats, NormalizedStats};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Nothing answered successfully; distinct from "answered with zeros"
    #[error("No servers reachable for admin statistics ({tried} tried, {} rejected the token)", .unauthorized.len())]
    NoServersReachable {
        tried: usize,
        unauthorized: Vec<String>,
    },
}
