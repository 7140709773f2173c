//! Multi-server discovery, failover and key caching
//!
//! The registry lists candidates; the selector picks one by probing, using
//! the shared context for sticky server and quarantine; the runner retries
//! operations across the pool; the key service caches the shared API key.

pub mod context;
pub mod donation;
pub mod health;
pub mod key_cache;
pub mod keys;
pub mod quarantine;
pub mod registry;
pub mod runner;
pub mod selector;

pub use context::FailoverContext;
pub use donation::{DonationLocator, DonationServer};
pub use health::{HealthDetails, HealthProbe, HealthProbeOptions, ProbeOutcome};
pub use key_cache::{CachedKey, KeyCache};
pub use keys::{KeyLease, KeyService};
pub use quarantine::QuarantineSet;
pub use registry::ServerRegistry;
pub use runner::OperationRunner;
pub use selector::{FailoverSelector, SelectorState};
