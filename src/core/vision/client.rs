use crate::config::VisionConfig;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::http_client::{HttpClientTrait, HttpRequest};
use crate::core::network::types::ClientError;
use crate::core::vision::VisionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the third-party `generateContent` endpoint
pub struct VisionClient {
    client: Arc<dyn HttpClientTrait>,
    config: VisionConfig,
    timeout_ms: u32,
}

impl VisionClient {
    pub fn new(client: Arc<dyn HttpClientTrait>, config: VisionConfig, timeout_ms: u32) -> Self {
        Self {
            client,
            config,
            timeout_ms,
        }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    fn endpoint_url(&self, api_key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            api_key
        )
    }

    /// Ask the model about a base64 image; returns the first text part
    pub async fn generate(&self, image_b64: &str, api_key: &str, prompt: &str) -> Result<String, ClientError> {
        let start = Instant::now();
        let result = self.generate_inner(image_b64, api_key, prompt).await;
        let outcome = match &result {
            Ok(_) => "success".to_string(),
            Err(e) => e.to_string(),
        };
        get_debug_logger().vision_outcome(&self.config.model, &outcome, start.elapsed().as_millis() as u64);
        result.map_err(ClientError::from)
    }

    async fn generate_inner(&self, image_b64: &str, api_key: &str, prompt: &str) -> Result<String, VisionError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text { text: prompt },
                    RequestPart::Image {
                        inline_data: InlineData {
                            mime_type: &self.config.mime_type,
                            data: image_b64,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        };
        let body = serde_json::to_value(&body).map_err(|e| VisionError::Transport(e.to_string()))?;
        let request = HttpRequest::post_json(self.endpoint_url(api_key), &body, self.timeout_ms)
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let bound = Duration::from_millis(self.timeout_ms as u64);
        let response = match tokio::time::timeout(bound, self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(message)) => return Err(VisionError::Transport(message)),
            Err(_) => return Err(VisionError::Transport("Request timeout".to_string())),
        };

        if !response.is_success() {
            let message = response
                .json()
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", response.status_code));
            return Err(VisionError::RequestFailed {
                status: response.status_code,
                message,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_slice(&response.body).map_err(|_| VisionError::UnexpectedResponse)?;
        extract_answer(parsed)
    }
}

fn extract_answer(response: GenerateResponse) -> Result<String, VisionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(VisionError::Blocked { reason });
    }
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|text| !text.is_empty())
        .ok_or(VisionError::UnexpectedResponse)
}
