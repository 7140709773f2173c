use crate::config::Config;
use crate::core::failover::health::url::{server_identifier, validate_base_url};
use crate::core::network::types::ClientError;

/// Ordered, immutable list of candidate backend base URLs
///
/// Loaded once from configuration; switching environment means building a
/// new registry. Order is only the deterministic fallback scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRegistry {
    candidates: Vec<String>,
}

impl ServerRegistry {
    /// Validate and normalize `urls`; duplicates keep their first position
    pub fn new<I, S>(urls: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates: Vec<String> = Vec::new();
        for raw in urls {
            let normalized = validate_base_url(raw.as_ref()).map_err(|e| {
                ClientError::Config(format!("Invalid server URL '{}': {}", raw.as_ref(), e))
            })?;
            if !candidates.contains(&normalized) {
                candidates.push(normalized);
            }
        }

        if candidates.is_empty() {
            return Err(ClientError::Config(
                "Server candidate list is empty".to_string(),
            ));
        }
        Ok(Self { candidates })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(config.base_urls())
    }

    pub fn list_candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, base_url: &str) -> bool {
        self.candidates.iter().any(|c| c == base_url)
    }

    pub fn index_of(&self, base_url: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c == base_url)
    }

    pub fn primary(&self) -> &str {
        &self.candidates[0]
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.candidates.iter().map(|c| server_identifier(c)).collect()
    }
}
