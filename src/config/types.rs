use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which candidate list the registry resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local multi-port servers (`http://localhost:<port>`)
    #[default]
    Development,
    /// Hosted multi-domain servers
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevelopmentConfig {
    pub ports: Vec<u16>,
    pub hostname: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    pub urls: Vec<String>,
}

/// Timeout tiers in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Re-validation of the sticky server (optimistic path, fail fast)
    pub sticky_probe_ms: u32,
    /// Cold candidates during a pool scan
    pub scan_probe_ms: u32,
    pub key_fetch_ms: u32,
    pub admin_stats_ms: u32,
    pub vision_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Quarantine is cleared wholesale after this window
    pub quarantine_reset_secs: u64,
    /// Pause before retrying after the last pool member failed
    pub last_server_retry_delay_ms: u64,
    pub health_path: String,
    /// Tried when `health_path` answers 404
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_health_path: Option<String>,
    pub key_path: String,
    pub admin_stats_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCacheConfig {
    pub ttl_secs: u64,
}

/// Vision-AI request parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub model: String,
    /// Models collection URL; `/{model}:generateContent` is appended
    pub endpoint: String,
    pub prompt: String,
    pub mime_type: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// Complete client configuration (`~/.kimaaka/config.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    /// Overrides `~/.kimaaka/storage.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
    pub development: DevelopmentConfig,
    pub production: ProductionConfig,
    pub timeouts: TimeoutConfig,
    pub failover: FailoverConfig,
    pub key_cache: KeyCacheConfig,
    pub vision: VisionConfig,
}
