//! Vision-AI call and the screenshot analysis pipeline

pub mod analysis;
pub mod client;

pub use analysis::AnalysisService;
pub use client::VisionClient;

/// Upstream vision API failure; never retried by the failover core
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// Content-policy rejection reported through `promptFeedback.blockReason`
    #[error("Request blocked: {reason}")]
    Blocked { reason: String },

    #[error("Analysis failed due to an unexpected API response.")]
    UnexpectedResponse,

    #[error("Vision transport error: {0}")]
    Transport(String),
}
