pub mod defaults;
pub mod types;

pub use defaults::DEFAULT_PROMPT;
pub use types::{
    Config, DevelopmentConfig, Environment, FailoverConfig, KeyCacheConfig, ProductionConfig,
    TimeoutConfig, VisionConfig,
};

use crate::core::network::types::ClientError;
use std::path::{Path, PathBuf};

impl Config {
    /// Default configuration path: `~/.kimaaka/config.toml`
    pub fn config_path() -> Result<PathBuf, ClientError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("Home directory not found".to_string()))?;
        Ok(home.join(".kimaaka").join("config.toml"))
    }

    /// Load from the default path, then apply environment overrides
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load() -> Result<Self, ClientError> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write the default configuration unless one already exists
    pub fn init() -> Result<PathBuf, ClientError> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Config(format!("Failed to create directory: {}", e)))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| ClientError::Config(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// `KIMAAKA_ENV` selects the environment; `KIMAAKA_SERVER_URLS` replaces
    /// the production list and forces production.
    pub fn apply_env_overrides(&mut self) -> Result<(), ClientError> {
        if let Ok(env_name) = std::env::var("KIMAAKA_ENV") {
            if !env_name.trim().is_empty() {
                self.environment = env_name.parse().map_err(ClientError::Config)?;
            }
        }

        if let Ok(urls) = std::env::var("KIMAAKA_SERVER_URLS") {
            let urls: Vec<String> = urls
                .split(',')
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
            if !urls.is_empty() {
                self.production.urls = urls;
                self.environment = Environment::Production;
            }
        }
        Ok(())
    }

    /// Base URLs (no `/api` suffix) for the active environment, in scan order
    pub fn base_urls(&self) -> Vec<String> {
        match self.environment {
            Environment::Production => self
                .production
                .urls
                .iter()
                .map(|u| u.trim_end_matches('/').to_string())
                .collect(),
            Environment::Development => self
                .development
                .ports
                .iter()
                .map(|port| {
                    format!(
                        "{}://{}:{}",
                        self.development.protocol, self.development.hostname, port
                    )
                })
                .collect(),
        }
    }

    /// Validate everything that would otherwise fail later at first use
    pub fn check(&self) -> Result<(), ClientError> {
        let urls = self.base_urls();
        if urls.is_empty() {
            return Err(ClientError::Config(format!(
                "No servers configured for {:?} environment",
                self.environment
            )));
        }
        for base in &urls {
            let parsed = url::Url::parse(base)
                .map_err(|e| ClientError::Config(format!("Invalid server URL {}: {}", base, e)))?;
            if parsed.host_str().is_none() {
                return Err(ClientError::Config(format!("Server URL has no host: {}", base)));
            }
        }
        if self.timeouts.sticky_probe_ms == 0 || self.timeouts.scan_probe_ms == 0 {
            return Err(ClientError::Config("Probe timeouts must be non-zero".to_string()));
        }
        if self.key_cache.ttl_secs == 0 {
            return Err(ClientError::Config("Key cache TTL must be non-zero".to_string()));
        }
        if !self.failover.health_path.starts_with('/') {
            return Err(ClientError::Config(format!(
                "Health path must start with '/': {}",
                self.failover.health_path
            )));
        }
        Ok(())
    }

    pub fn print(&self) -> Result<(), ClientError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;
        println!("{}", content);
        Ok(())
    }
}
