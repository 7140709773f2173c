// Core types shared by the failover, admin and vision layers

use crate::core::admin::AdminError;
use crate::core::vision::VisionError;

/// Crate-wide error taxonomy
///
/// Transient transport failures against a single candidate are `Http`; they
/// are recovered inside the failover core by quarantining the candidate and
/// only surface as part of `AllServersFailed` or `NoServerReachable`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Candidate list empty or malformed, bad TOML, missing home directory
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every candidate failed its probe, even after one quarantine reset
    #[error("No server reachable after trying {tried} candidate(s)")]
    NoServerReachable { tried: usize },

    /// Operation budget exhausted
    #[error("All servers failed after {attempts} attempts. Last error: {last_error}")]
    AllServersFailed { attempts: usize, last_error: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Admin operation attempted without a session token
    #[error("Authentication required for admin operations. Please log in first.")]
    Unauthorized,

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Vision(#[from] VisionError),
}

impl ClientError {
    /// Pool exhaustion is the only failure the UI layer reports as "service unavailable"
    pub fn is_pool_exhaustion(&self) -> bool {
        matches!(
            self,
            ClientError::NoServerReachable { .. } | ClientError::AllServersFailed { .. }
        )
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Storage(error.to_string())
    }
}

/// Selection policy used when the pool has more than one member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Walk the pool in configuration order (admin console, deterministic scans)
    Sequential,
    /// Uniform random choice among the pool (key fetch load spreading)
    Random,
}

/// Parse boolean environment variables
///
/// Accepts true/1/yes/on (case insensitive). Everything else, including an
/// unset variable, is false.
pub fn parse_env_bool(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}

/// Generate standardized local timezone ISO-8601 timestamp
///
/// Used for debug log entries.
pub fn get_local_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Mask an API key for display: first 4 and last 4 characters kept
///
/// Keys of 8 characters or fewer are masked entirely.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
