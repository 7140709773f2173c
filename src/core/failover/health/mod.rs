//! Server Health Probing
//!
//! - Bounded-timeout GET against `/api/health`, with `/health` as a 404 fallback
//! - Healthy iff 2xx within the timeout; the body is advisory
//! - Two timeout tiers chosen by the caller (sticky re-validation vs cold scan)

pub mod parsing;
pub mod probe;
pub mod url;

pub use parsing::{parse_health_body, HealthDetails};
pub use probe::{HealthProbe, HealthProbeOptions, ProbeOutcome};
pub use url::{build_endpoint_url, normalize_base_url, server_identifier, validate_base_url};
