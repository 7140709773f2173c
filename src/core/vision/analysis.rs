use crate::core::failover::keys::KeyService;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::ClientError;
use crate::core::vision::client::VisionClient;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

/// Screenshot in, answer out
///
/// Chains the shared-key lookup with the vision call. The on-page result box
/// shows an empty answer for every failure, so `analyze` never errors.
pub struct AnalysisService {
    keys: Arc<KeyService>,
    vision: Arc<VisionClient>,
}

impl AnalysisService {
    pub fn new(keys: Arc<KeyService>, vision: Arc<VisionClient>) -> Self {
        Self { keys, vision }
    }

    /// Analyze raw PNG bytes, surfacing every failure
    pub async fn analyze_strict(&self, png: &[u8]) -> Result<String, ClientError> {
        let lease = self.keys.get_cached_api_key().await?;
        let image_b64 = STANDARD.encode(png);
        let prompt = self.vision.config().prompt.clone();
        self.vision.generate(&image_b64, &lease.key, &prompt).await
    }

    /// Analyze raw PNG bytes; any failure yields an empty answer
    pub async fn analyze(&self, png: &[u8]) -> String {
        match self.analyze_strict(png).await {
            Ok(answer) => answer,
            Err(e) => {
                get_debug_logger().error_sync("AnalysisService", "analysis_failed", &e.to_string());
                String::new()
            }
        }
    }
}
